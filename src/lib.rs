//! spritegen composes layered character sprite sheets.
//!
//! A [`SelectionState`] names one pick per body and outfit layer. The [`LayerCatalog`] says what
//! exists for each frame size and body type. A [`SpriteGenerator`] session turns selections into
//! a 3x4 sheet of walk poses plus an animated walk-cycle preview:
//!
//! - Plan the ordered layer set and resolve asset paths
//! - Load images through a shared [`ImageCache`] and wait on a [`LoadBarrier`]
//! - Composite the sheet, start the preview, export PNG bytes
//!
//! The session is single-threaded. Loads and timers advance on a virtual clock driven by
//! [`SpriteGenerator::advance`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assets;
mod catalog;
mod config;
mod foundation;
mod layering;
mod render;
mod runtime;
mod selection;
mod session;

pub use crate::foundation::core::{FRAMES_X, FRAMES_Y, FrameSize, Offset};
pub use crate::foundation::error::{SpriteError, SpriteResult};

pub use crate::assets::cache::{ImageCache, ImageHandle, LoadState};
pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::path::{
    AssetId, AssetPath, AssetRequest, index_string, join_path, normalize_rel_path,
    resolve as resolve_asset_path,
};
pub use crate::assets::source::{AssetSource, FsAssetSource, MemoryAssetSource};
pub use crate::catalog::layers::{BaseLayer, LayerCategory, LayerRef, OutfitLayer};
pub use crate::catalog::model::{BodyMapping, LayerCatalog, OutfitEntry, SizeCatalog, body_map_key};
pub use crate::config::SpriteConfig;
pub use crate::layering::builder::{
    LayerDrawRequest, LayerPlan, REAR_SUFFIX, build as build_layers, head_offset,
    plan as plan_layers,
};
pub use crate::render::animation::{
    AnimationCycler, AnimationOpts, CYCLE_FRAMES, MIN_TICK_INTERVAL, STRIP_SLICES, build_strip,
    strip_row,
};
pub use crate::render::blend::{PremulRgba8, over};
pub use crate::render::compositor::composite;
pub use crate::render::surface::{DstRect, PixelSource, SrcRect, Surface, build_png};
pub use crate::runtime::barrier::{JoinToken, LoadBarrier};
pub use crate::runtime::scheduler::{Scheduler, TimerId, TimerKind};
pub use crate::selection::SelectionState;
pub use crate::session::generator::{GeneratorOpts, RenderStatus, SpriteGenerator};
