use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::error::{SpriteError, SpriteResult};
use crate::render::animation::AnimationOpts;
use crate::session::generator::GeneratorOpts;

/// Session configuration file. Every member is optional.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpriteConfig {
    /// Directory holding the layer images.
    pub asset_root: PathBuf,
    /// Layer catalog JSON.
    pub catalog: PathBuf,
    /// Minimum time a walk-cycle frame stays on screen.
    pub frame_delay_ms: u64,
    /// Preview redraw interval.
    pub tick_interval_ms: f64,
    /// Stall timeout for a render's image loads.
    pub load_timeout_ms: u64,
    /// Always produce upscaled output.
    pub upscale: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            catalog: PathBuf::from("assets/layers.json"),
            frame_delay_ms: 250,
            tick_interval_ms: 1000.0 / 30.0,
            load_timeout_ms: 5000,
            upscale: false,
        }
    }
}

impl SpriteConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SpriteResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| SpriteError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration file; relative paths in it are resolved against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> SpriteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SpriteError::configuration(format!("open config '{}': {e}", path.display()))
        })?;
        let cfg = Self::from_reader(BufReader::new(f))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(cfg.relative_to(base))
    }

    /// Resolve relative `asset_root` and `catalog` against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.asset_root.is_relative() {
            self.asset_root = base.join(&self.asset_root);
        }
        if self.catalog.is_relative() {
            self.catalog = base.join(&self.catalog);
        }
        self
    }

    /// Reject timings the session cannot run with.
    pub fn validate(&self) -> SpriteResult<()> {
        if self.frame_delay_ms == 0 {
            return Err(SpriteError::validation("frame_delay_ms must be > 0"));
        }
        if !self.tick_interval_ms.is_finite() || self.tick_interval_ms <= 0.0 {
            return Err(SpriteError::validation(
                "tick_interval_ms must be a positive number",
            ));
        }
        if self.load_timeout_ms == 0 {
            return Err(SpriteError::validation("load_timeout_ms must be > 0"));
        }
        self.animation_opts().validate()
    }

    fn animation_opts(&self) -> AnimationOpts {
        AnimationOpts {
            frame_delay: Duration::from_millis(self.frame_delay_ms),
            tick_interval: Duration::from_nanos((self.tick_interval_ms * 1e6).round() as u64),
        }
    }

    /// Session options for this configuration.
    pub fn generator_opts(&self) -> SpriteResult<GeneratorOpts> {
        self.validate()?;
        Ok(GeneratorOpts {
            animation: self.animation_opts(),
            load_timeout: Duration::from_millis(self.load_timeout_ms),
            upscale: self.upscale,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
