use std::fmt;
use std::str::FromStr;

use crate::foundation::error::SpriteError;

/// Which asset tree a layer is resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerCategory {
    /// Body-intrinsic layers.
    Base,
    /// Equippable layers.
    Outfit,
}

impl LayerCategory {
    /// Directory segment used in asset paths.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Outfit => "outfit",
        }
    }
}

/// Body-intrinsic layer names, in registry (draw) order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseLayer {
    /// Torso and legs of the bare body.
    Body,
    /// Arms; drawn over the body.
    Arms,
    /// Head shape.
    Head,
    /// Eyes.
    Eyes,
    /// Ears.
    Ears,
}

impl BaseLayer {
    /// All base layers in registry order.
    pub const ALL: [Self; 5] = [Self::Body, Self::Arms, Self::Head, Self::Eyes, Self::Ears];

    /// Name used in catalogs and asset paths.
    pub fn name(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Arms => "arms",
            Self::Head => "head",
            Self::Eyes => "eyes",
            Self::Ears => "ears",
        }
    }

    /// Unique layers have art per body type; common layers are shared within a size.
    pub fn is_unique(self) -> bool {
        matches!(self, Self::Body | Self::Arms)
    }

    /// Layers that also carry a `rear` component drawn behind everything.
    pub fn has_rear(self) -> bool {
        matches!(self, Self::Head | Self::Ears)
    }

    /// Head-region layers follow the body-type offset table.
    pub fn is_head_region(self) -> bool {
        !self.is_unique()
    }
}

/// Equippable layer names, in registry order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutfitLayer {
    /// Footwear.
    Shoes,
    /// Trousers and skirts.
    Legs,
    /// Shirts and armour.
    Torso,
    /// Face coverings.
    Mask,
    /// Hair; painted under the eyes and ears.
    Hair,
    /// Headwear.
    Hat,
    /// Capes and other accessories with a rear component.
    Detail,
}

impl OutfitLayer {
    /// All outfit layers in registry order.
    pub const ALL: [Self; 7] = [
        Self::Shoes,
        Self::Legs,
        Self::Torso,
        Self::Mask,
        Self::Hair,
        Self::Hat,
        Self::Detail,
    ];

    /// Name used in catalogs and asset paths.
    pub fn name(self) -> &'static str {
        match self {
            Self::Shoes => "shoes",
            Self::Legs => "legs",
            Self::Torso => "torso",
            Self::Mask => "mask",
            Self::Hair => "hair",
            Self::Hat => "hat",
            Self::Detail => "detail",
        }
    }

    /// Layers worn on the head follow the body-type offset table.
    pub fn is_head_region(self) -> bool {
        matches!(self, Self::Hair | Self::Mask | Self::Hat)
    }

    /// Layers that also carry a `rear` component drawn behind everything.
    pub fn has_rear(self) -> bool {
        matches!(self, Self::Detail)
    }
}

/// A layer of either category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerRef {
    /// A base layer.
    Base(BaseLayer),
    /// An outfit layer.
    Outfit(OutfitLayer),
}

impl LayerRef {
    /// Asset tree this layer lives in.
    pub fn category(self) -> LayerCategory {
        match self {
            Self::Base(_) => LayerCategory::Base,
            Self::Outfit(_) => LayerCategory::Outfit,
        }
    }

    /// Name used in catalogs and asset paths.
    pub fn name(self) -> &'static str {
        match self {
            Self::Base(l) => l.name(),
            Self::Outfit(l) => l.name(),
        }
    }

    /// Whether the layer follows the body-type offset table.
    pub fn is_head_region(self) -> bool {
        match self {
            Self::Base(l) => l.is_head_region(),
            Self::Outfit(l) => l.is_head_region(),
        }
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for OutfitLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseLayer {
    type Err = SpriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| SpriteError::invalid_selection(format!("unknown base layer '{s}'")))
    }
}

impl FromStr for OutfitLayer {
    type Err = SpriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| SpriteError::invalid_selection(format!("unknown outfit layer '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/layers.rs"]
mod tests;
