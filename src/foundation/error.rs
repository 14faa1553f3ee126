/// Convenience result type used across spritegen.
pub type SpriteResult<T> = Result<T, SpriteError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum SpriteError {
    /// The layer catalog is missing an entry or a required table.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The selection references a size, body type, layer or index the catalog does not offer.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// An image resource could not be read, decoded, or did not load in time.
    #[error("asset load failure: {0}")]
    AssetLoad(String),

    /// Malformed paths, sizes, mapping values or JSON documents.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpriteError {
    /// Build a [`SpriteError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`SpriteError::InvalidSelection`] value.
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    /// Build a [`SpriteError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`SpriteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
