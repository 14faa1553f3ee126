use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::path::AssetPath;
use crate::foundation::error::{SpriteError, SpriteResult};

/// Byte transport for asset files.
pub trait AssetSource {
    /// Read the raw bytes of an asset.
    fn read(&self, path: &AssetPath) -> SpriteResult<Vec<u8>>;
}

/// Reads assets from a directory on disk.
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory used when resolving relative asset paths.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn read(&self, path: &AssetPath) -> SpriteResult<Vec<u8>> {
        let full = self.root.join(Path::new(path.as_str()));
        std::fs::read(&full)
            .with_context(|| format!("read asset bytes from '{}'", full.display()))
            .map_err(SpriteError::from)
    }
}

/// In-memory asset table, for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetSource {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under a relative path (normalized on insert).
    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) -> SpriteResult<()> {
        let path = AssetPath::new(path)?;
        self.files.insert(path.as_str().to_string(), bytes);
        Ok(())
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file is stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemoryAssetSource {
    fn read(&self, path: &AssetPath) -> SpriteResult<Vec<u8>> {
        self.files
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| SpriteError::asset_load(format!("no asset at '{path}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
