use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::catalog::layers::{BaseLayer, OutfitLayer};
use crate::catalog::model::{BodyMapping, LayerCatalog};
use crate::foundation::core::FrameSize;
use crate::foundation::error::{SpriteError, SpriteResult};

/// One complete UI state: what the user picked for every layer.
///
/// Selections are values. Every interaction produces a new one (see the `with_*` builders)
/// which is then handed to [`crate::SpriteGenerator::render`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionState {
    /// Frame size, also the catalog key.
    pub size: FrameSize,
    /// Body type within the size (e.g. `adult`, `elder`).
    pub body_type: String,
    /// Selected index per base layer; every base layer must be present.
    #[serde(default)]
    pub base: BTreeMap<BaseLayer, u32>,
    /// Selected index per outfit layer; absent means 0 ("none").
    #[serde(default)]
    pub outfit: BTreeMap<OutfitLayer, u32>,
    /// Base-layer visibility toggles; absent means visible.
    #[serde(default)]
    pub visible: BTreeMap<BaseLayer, bool>,
    /// Draw previews at twice the native frame size.
    #[serde(default)]
    pub upscale: bool,
    /// Per-layer body mapping (`<bodyType>-<index>` or `null`) overriding the catalog table.
    #[serde(default)]
    pub bodymap: BTreeMap<OutfitLayer, String>,
}

impl SelectionState {
    /// Selection with every base layer at index 0 and no outfit.
    pub fn new(size: FrameSize, body_type: impl Into<String>) -> Self {
        Self {
            size,
            body_type: body_type.into(),
            base: BaseLayer::ALL.into_iter().map(|l| (l, 0)).collect(),
            outfit: BTreeMap::new(),
            visible: BTreeMap::new(),
            upscale: false,
            bodymap: BTreeMap::new(),
        }
    }

    /// Parse a selection record from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SpriteResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| SpriteError::invalid_selection(format!("parse selection JSON: {e}")))
    }

    /// Parse a selection record from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SpriteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SpriteError::validation(format!("open selection JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Replace one base-layer index.
    pub fn with_base(mut self, layer: BaseLayer, index: u32) -> Self {
        self.base.insert(layer, index);
        self
    }

    /// Replace one outfit-layer index (0 clears the layer).
    pub fn with_outfit(mut self, layer: OutfitLayer, index: u32) -> Self {
        self.outfit.insert(layer, index);
        self
    }

    /// Toggle preview visibility of a base layer.
    pub fn with_visible(mut self, layer: BaseLayer, visible: bool) -> Self {
        self.visible.insert(layer, visible);
        self
    }

    /// Toggle 2x previews.
    pub fn with_upscale(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }

    /// Force a body mapping for an outfit layer.
    pub fn with_bodymap(mut self, layer: OutfitLayer, mapping: &BodyMapping) -> Self {
        self.bodymap.insert(layer, mapping.to_string());
        self
    }

    /// Selected index of a base layer.
    pub fn base_index(&self, layer: BaseLayer) -> SpriteResult<u32> {
        self.base.get(&layer).copied().ok_or_else(|| {
            SpriteError::invalid_selection(format!("no index selected for base layer '{layer}'"))
        })
    }

    /// Selected index of an outfit layer (0 when unset).
    pub fn outfit_index(&self, layer: OutfitLayer) -> u32 {
        self.outfit.get(&layer).copied().unwrap_or(0)
    }

    /// Whether a base layer is drawn in the preview.
    pub fn is_visible(&self, layer: BaseLayer) -> bool {
        self.visible.get(&layer).copied().unwrap_or(true)
    }

    /// Body mapping forced by the selection for an outfit layer.
    pub fn bodymap_override(&self, layer: OutfitLayer) -> SpriteResult<Option<BodyMapping>> {
        self.bodymap
            .get(&layer)
            .map(|raw| raw.parse::<BodyMapping>())
            .transpose()
    }

    /// Check every reference against the catalog.
    pub fn validate(&self, catalog: &LayerCatalog) -> SpriteResult<()> {
        let sizes = catalog.size(self.size)?;
        sizes.base_indexes(&self.body_type)?;

        for layer in BaseLayer::ALL {
            let idx = self.base_index(layer)?;
            let count = sizes.base_count(&self.body_type, layer)?;
            if idx >= count {
                return Err(SpriteError::invalid_selection(format!(
                    "base layer '{layer}' index {idx} out of range (available: {count})"
                )));
            }
        }

        for (&layer, &idx) in &self.outfit {
            if idx == 0 {
                continue;
            }
            let entry = sizes.outfit(layer).ok_or_else(|| {
                SpriteError::invalid_selection(format!(
                    "outfit layer '{layer}' is not available for {}",
                    self.size
                ))
            })?;
            let count = entry.count(layer)?;
            if idx > count {
                return Err(SpriteError::invalid_selection(format!(
                    "outfit layer '{layer}' index {idx} out of range (available: {count})"
                )));
            }
        }

        for layer in self.bodymap.keys() {
            self.bodymap_override(*layer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/selection.rs"]
mod tests;
