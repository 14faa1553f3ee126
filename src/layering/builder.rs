use tracing::debug;

use crate::assets::cache::{ImageCache, ImageHandle};
use crate::assets::path::{AssetPath, AssetRequest, resolve};
use crate::catalog::layers::{BaseLayer, LayerRef, OutfitLayer};
use crate::catalog::model::{BodyMapping, LayerCatalog, SizeCatalog, body_map_key};
use crate::foundation::core::{FrameSize, Offset};
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::foundation::math::scaled_floor;
use crate::selection::SelectionState;

/// Suffix of the sprite drawn behind a head, ears or detail layer.
pub const REAR_SUFFIX: &str = "rear";

// Hair goes under eyes and ears but over the body layers and rear variants.
const HAIR_POSITION: usize = 5;

/// One planned layer: which asset to draw, where, and whether it is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerPlan {
    /// Layer this entry belongs to.
    pub layer: LayerRef,
    /// Component suffix, `Some("rear")` for rear variants.
    pub suffix: Option<&'static str>,
    /// Resolved asset path.
    pub path: AssetPath,
    /// Draw offset in unscaled pixels.
    pub offset: Offset,
    /// Skipped by the compositor while still being loaded.
    pub hidden: bool,
}

/// A planned layer bound to its cached image.
#[derive(Clone, Debug)]
pub struct LayerDrawRequest {
    /// Layer this entry belongs to.
    pub layer: LayerRef,
    /// Component suffix, `Some("rear")` for rear variants.
    pub suffix: Option<&'static str>,
    /// Cache key of the image.
    pub asset_key: AssetPath,
    /// Shared image handle.
    pub image: ImageHandle,
    /// Draw offset in unscaled pixels.
    pub offset: Offset,
    /// Skipped when compositing.
    pub hidden: bool,
}

/// Offset applied to head-region layers for a body type.
///
/// Computed from the unscaled frame size; unknown body types are not shifted.
pub fn head_offset(body_type: &str, frame: FrameSize) -> Offset {
    let (w, h) = (frame.width, frame.height);
    match body_type {
        "child" => Offset::new(0, scaled_floor(6, h, 64)),
        "dwarf" | "short" => Offset::new(0, scaled_floor(4, h, 64)),
        "elder" => Offset::new(scaled_floor(4, w, 48), scaled_floor(5, h, 64)),
        "tall" => Offset::new(0, scaled_floor(-5, h, 64)),
        _ => Offset::ZERO,
    }
}

/// Order the layers of a selection bottom to top, without touching the image cache.
///
/// Sequence: `head-rear`, `ears-rear`, `body`, `arms`, `head`, `eyes`, `ears`, then each selected
/// outfit layer in registry order with `hair` inserted at position 5. A selected `detail` adds its
/// rear variant at the very front.
#[tracing::instrument(skip_all, fields(size = %selection.size, body = %selection.body_type))]
pub fn plan(selection: &SelectionState, catalog: &LayerCatalog) -> SpriteResult<Vec<LayerPlan>> {
    let sizes = catalog.size(selection.size)?;
    let head = head_offset(&selection.body_type, selection.size);
    let mut out: Vec<LayerPlan> = Vec::with_capacity(BaseLayer::ALL.len() + 2 + 8);

    for layer in BaseLayer::ALL {
        let index = selection.base_index(layer)?;
        out.push(base_plan(selection, layer, index, None, head)?);
    }

    // Last pushed at the front ends up bottom-most.
    for layer in [BaseLayer::Ears, BaseLayer::Head] {
        let index = selection.base_index(layer)?;
        out.insert(0, base_plan(selection, layer, index, Some(REAR_SUFFIX), head)?);
    }

    let mut detail_rear = None;
    for layer in OutfitLayer::ALL {
        let index = selection.outfit_index(layer);
        if index == 0 {
            continue;
        }
        let Some(target) = outfit_target(selection, sizes, layer, index)? else {
            debug!(layer = %layer, index, "outfit layer suppressed by body map");
            continue;
        };

        let offset = if layer.is_head_region() { head } else { Offset::ZERO };
        let entry = outfit_plan(selection.size, layer, &target, None, offset)?;
        if layer == OutfitLayer::Hair {
            out.insert(HAIR_POSITION.min(out.len()), entry);
        } else {
            out.push(entry);
        }

        if layer.has_rear() {
            detail_rear = Some(outfit_plan(
                selection.size,
                layer,
                &target,
                Some(REAR_SUFFIX),
                Offset::ZERO,
            )?);
        }
    }
    if let Some(rear) = detail_rear {
        out.insert(0, rear);
    }

    debug!(layers = out.len(), "planned layer set");
    Ok(out)
}

/// Plan the selection and bind every entry to its cache handle, queueing new loads.
pub fn build(
    selection: &SelectionState,
    catalog: &LayerCatalog,
    cache: &mut ImageCache,
) -> SpriteResult<Vec<LayerDrawRequest>> {
    let planned = plan(selection, catalog)?;
    Ok(planned
        .into_iter()
        .map(|p| LayerDrawRequest {
            image: cache.get_or_create(&p.path),
            layer: p.layer,
            suffix: p.suffix,
            asset_key: p.path,
            offset: p.offset,
            hidden: p.hidden,
        })
        .collect())
}

fn base_plan(
    selection: &SelectionState,
    layer: BaseLayer,
    index: u32,
    suffix: Option<&'static str>,
    head: Offset,
) -> SpriteResult<LayerPlan> {
    let path = resolve(&AssetRequest {
        size: selection.size,
        body_type: Some(&selection.body_type),
        layer: LayerRef::Base(layer),
        index,
        suffix,
    })?;
    let hidden = !selection.is_visible(layer);
    if hidden {
        debug!(layer = %layer, suffix = suffix.unwrap_or(""), "base layer hidden");
    }
    Ok(LayerPlan {
        layer: LayerRef::Base(layer),
        suffix,
        path,
        offset: if layer.is_head_region() { head } else { Offset::ZERO },
        hidden,
    })
}

struct OutfitTarget {
    body_type: Option<String>,
    index: u32,
}

fn outfit_target(
    selection: &SelectionState,
    sizes: &SizeCatalog,
    layer: OutfitLayer,
    index: u32,
) -> SpriteResult<Option<OutfitTarget>> {
    let entry = sizes.outfit(layer).ok_or_else(|| {
        SpriteError::configuration(format!(
            "no catalog entry for outfit layer '{layer}' at {}",
            selection.size
        ))
    })?;
    entry.count(layer)?;
    let Some(table) = entry.bodymap(layer)? else {
        if selection.bodymap.contains_key(&layer) {
            debug!(layer = %layer, "body map override ignored for shared outfit art");
        }
        return Ok(Some(OutfitTarget {
            body_type: None,
            index,
        }));
    };

    let mapping = match selection.bodymap_override(layer)? {
        Some(forced) => Some(forced),
        None => {
            let body_index = selection.base_index(BaseLayer::Body)?;
            table
                .get(&body_map_key(index, &selection.body_type, body_index))
                .cloned()
        }
    };

    Ok(match mapping {
        Some(BodyMapping::Suppress) => None,
        Some(BodyMapping::Substitute { body_type, index }) => {
            debug!(layer = %layer, body_type = %body_type, index, "using body map");
            Some(OutfitTarget {
                body_type: Some(body_type),
                index,
            })
        }
        None => Some(OutfitTarget {
            body_type: Some(selection.body_type.clone()),
            index,
        }),
    })
}

fn outfit_plan(
    size: FrameSize,
    layer: OutfitLayer,
    target: &OutfitTarget,
    suffix: Option<&'static str>,
    offset: Offset,
) -> SpriteResult<LayerPlan> {
    let path = resolve(&AssetRequest {
        size,
        body_type: target.body_type.as_deref(),
        layer: LayerRef::Outfit(layer),
        index: target.index,
        suffix,
    })?;
    Ok(LayerPlan {
        layer: LayerRef::Outfit(layer),
        suffix,
        path,
        offset,
        hidden: false,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layering/builder.rs"]
mod tests;
