use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{SpriteError, SpriteResult};

/// Number of frame columns in a character sheet.
pub const FRAMES_X: u32 = 3;
/// Number of frame rows (facing directions) in a character sheet.
pub const FRAMES_Y: u32 = 4;

/// Pixel dimensions of a single sheet frame.
///
/// The textual form `"<W>x<H>"` doubles as the catalog key and the first asset path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameSize {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Build a frame size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> SpriteResult<Self> {
        if width == 0 || height == 0 {
            return Err(SpriteError::validation("frame size must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Multiply both dimensions by `factor`.
    pub fn scaled(self, factor: u32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Size of the full `FRAMES_X` x `FRAMES_Y` sheet built from frames of this size.
    pub fn sheet(self) -> (u32, u32) {
        (self.width * FRAMES_X, self.height * FRAMES_Y)
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for FrameSize {
    type Err = SpriteError;

    fn from_str(s: &str) -> SpriteResult<Self> {
        let (w, h) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| SpriteError::validation(format!("frame size '{s}' is not WxH")))?;
        let parse = |v: &str| {
            v.parse::<u32>()
                .map_err(|e| SpriteError::validation(format!("frame size '{s}': {e}")))
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

impl TryFrom<String> for FrameSize {
    type Error = SpriteError;

    fn try_from(value: String) -> SpriteResult<Self> {
        value.parse()
    }
}

impl From<FrameSize> for String {
    fn from(value: FrameSize) -> Self {
        value.to_string()
    }
}

/// Signed pixel offset applied when drawing a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Offset {
    /// Horizontal offset; non-zero values trigger per-row slicing.
    pub x: i32,
    /// Vertical offset.
    pub y: i32,
}

impl Offset {
    /// The zero offset.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Build an offset.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
