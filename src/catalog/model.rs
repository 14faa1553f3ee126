use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use crate::catalog::layers::{BaseLayer, OutfitLayer};
use crate::foundation::core::FrameSize;
use crate::foundation::error::{SpriteError, SpriteResult};

/// Replacement rule stored in a body-map table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyMapping {
    /// The `null` sentinel: the layer is not drawn for this combination.
    Suppress,
    /// Draw the art of another body type and index instead.
    Substitute {
        /// Body type whose art is borrowed.
        body_type: String,
        /// Outfit index to draw for that body type.
        index: u32,
    },
}

impl FromStr for BodyMapping {
    type Err = SpriteError;

    fn from_str(s: &str) -> SpriteResult<Self> {
        let s = s.trim();
        if s == "null" {
            return Ok(Self::Suppress);
        }
        let (body_type, index) = s.rsplit_once('-').ok_or_else(|| {
            SpriteError::validation(format!("body mapping '{s}' is not '<bodyType>-<index>'"))
        })?;
        if body_type.is_empty() {
            return Err(SpriteError::validation(format!(
                "body mapping '{s}' has an empty body type"
            )));
        }
        let index = index
            .parse::<u32>()
            .map_err(|e| SpriteError::validation(format!("body mapping '{s}': {e}")))?;
        Ok(Self::Substitute {
            body_type: body_type.to_string(),
            index,
        })
    }
}

impl fmt::Display for BodyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suppress => f.write_str("null"),
            Self::Substitute { body_type, index } => write!(f, "{body_type}-{index}"),
        }
    }
}

/// Key of a body-map table entry: `<outfitIndex>-<bodyType>-<bodyIndex>`.
pub fn body_map_key(outfit_index: u32, body_type: &str, body_index: u32) -> String {
    format!("{outfit_index}-{body_type}-{body_index}")
}

/// Catalog entry of one outfit layer.
///
/// The plain form is just an index count. The table form marks body-specific art and must carry
/// both `indexes` and `bodymap`; a missing member surfaces as a configuration error when the
/// layer is used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutfitEntry {
    /// Body-independent art with `count` selectable indices.
    Plain {
        /// Number of selectable indices (1-based; 0 is "none").
        count: u32,
    },
    /// Body-specific art resolved through a body-map table.
    Mapped {
        /// Number of selectable indices, if declared.
        count: Option<u32>,
        /// Substitution table, if declared.
        bodymap: Option<BTreeMap<String, BodyMapping>>,
    },
}

impl OutfitEntry {
    /// Declared index count.
    pub fn count(&self, layer: OutfitLayer) -> SpriteResult<u32> {
        match self {
            Self::Plain { count } => Ok(*count),
            Self::Mapped { count, .. } => count.ok_or_else(|| {
                SpriteError::configuration(format!("outfit layer '{layer}' is missing 'indexes'"))
            }),
        }
    }

    /// Body-map table for body-specific art, `None` for plain entries.
    pub fn bodymap(
        &self,
        layer: OutfitLayer,
    ) -> SpriteResult<Option<&BTreeMap<String, BodyMapping>>> {
        match self {
            Self::Plain { .. } => Ok(None),
            Self::Mapped { bodymap, .. } => bodymap.as_ref().map(Some).ok_or_else(|| {
                SpriteError::configuration(format!(
                    "outfit layer '{layer}' requires a 'bodymap' table"
                ))
            }),
        }
    }
}

/// Layers available for one frame size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeCatalog {
    base: BTreeMap<String, BTreeMap<BaseLayer, u32>>,
    outfit: BTreeMap<OutfitLayer, OutfitEntry>,
}

impl SizeCatalog {
    /// Body types offered for this size.
    pub fn body_types(&self) -> impl Iterator<Item = &str> {
        self.base.keys().map(String::as_str)
    }

    /// Available base-layer index counts for a body type.
    pub fn base_indexes(&self, body_type: &str) -> SpriteResult<&BTreeMap<BaseLayer, u32>> {
        self.base.get(body_type).ok_or_else(|| {
            SpriteError::invalid_selection(format!("invalid body type requested: {body_type}"))
        })
    }

    /// Index count of one base layer for a body type.
    pub fn base_count(&self, body_type: &str, layer: BaseLayer) -> SpriteResult<u32> {
        self.base_indexes(body_type)?
            .get(&layer)
            .copied()
            .ok_or_else(|| {
                SpriteError::invalid_selection(format!(
                    "base layer '{layer}' is not available for body type '{body_type}'"
                ))
            })
    }

    /// Catalog entry for an outfit layer, if the size offers it.
    pub fn outfit(&self, layer: OutfitLayer) -> Option<&OutfitEntry> {
        self.outfit.get(&layer)
    }

    /// All outfit entries in registry order.
    pub fn outfits(&self) -> impl Iterator<Item = (OutfitLayer, &OutfitEntry)> {
        self.outfit.iter().map(|(l, e)| (*l, e))
    }
}

/// Static table of available layers, loaded once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerCatalog {
    sizes: BTreeMap<FrameSize, SizeCatalog>,
    labels: BTreeMap<String, BTreeMap<u32, String>>,
}

#[derive(serde::Deserialize)]
struct CatalogDef {
    #[serde(default)]
    labels: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(flatten)]
    sizes: BTreeMap<String, SizeDef>,
}

#[derive(serde::Deserialize)]
struct SizeDef {
    #[serde(default)]
    base: BTreeMap<String, BTreeMap<BaseLayer, u32>>,
    #[serde(default)]
    outfit: BTreeMap<OutfitLayer, OutfitEntryDef>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OutfitEntryDef {
    Count(u32),
    Table {
        #[serde(default)]
        indexes: Option<u32>,
        #[serde(default)]
        bodymap: Option<BTreeMap<String, String>>,
    },
}

impl LayerCatalog {
    /// Parse a catalog from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SpriteResult<Self> {
        let def: CatalogDef = serde_json::from_reader(r)
            .map_err(|e| SpriteError::validation(format!("parse layer catalog JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse a catalog from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SpriteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SpriteError::configuration(format!("open layer catalog '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    fn from_def(def: CatalogDef) -> SpriteResult<Self> {
        let mut sizes = BTreeMap::new();
        for (key, size_def) in def.sizes {
            let size: FrameSize = key.parse()?;
            let mut outfit = BTreeMap::new();
            for (layer, entry) in size_def.outfit {
                let entry = match entry {
                    OutfitEntryDef::Count(count) => OutfitEntry::Plain { count },
                    OutfitEntryDef::Table { indexes, bodymap } => OutfitEntry::Mapped {
                        count: indexes,
                        bodymap: bodymap.map(parse_bodymap).transpose()?,
                    },
                };
                outfit.insert(layer, entry);
            }
            sizes.insert(
                size,
                SizeCatalog {
                    base: size_def.base,
                    outfit,
                },
            );
        }

        let mut labels = BTreeMap::new();
        for (layer, entries) in def.labels {
            let mut by_index = BTreeMap::new();
            for (idx, text) in entries {
                let idx = idx.parse::<u32>().map_err(|e| {
                    SpriteError::validation(format!("label index '{idx}' for '{layer}': {e}"))
                })?;
                by_index.insert(idx, text);
            }
            labels.insert(layer, by_index);
        }

        Ok(Self { sizes, labels })
    }

    /// Frame sizes offered by the catalog.
    pub fn sizes(&self) -> impl Iterator<Item = FrameSize> + '_ {
        self.sizes.keys().copied()
    }

    /// Layers of one frame size.
    pub fn size(&self, size: FrameSize) -> SpriteResult<&SizeCatalog> {
        self.sizes.get(&size).ok_or_else(|| {
            SpriteError::invalid_selection(format!("invalid dimensions requested: {size}"))
        })
    }

    /// Available base-layer indexes for a size and body type.
    pub fn base_indexes(
        &self,
        size: FrameSize,
        body_type: &str,
    ) -> SpriteResult<&BTreeMap<BaseLayer, u32>> {
        self.size(size)?.base_indexes(body_type)
    }

    /// Display label for a layer index, if the catalog declares one.
    pub fn label(&self, layer: &str, index: u32) -> Option<&str> {
        self.labels
            .get(layer)
            .and_then(|m| m.get(&index))
            .map(String::as_str)
    }
}

fn parse_bodymap(raw: BTreeMap<String, String>) -> SpriteResult<BTreeMap<String, BodyMapping>> {
    raw.into_iter()
        .map(|(k, v)| Ok((k, v.parse::<BodyMapping>()?)))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
