use std::fmt;

use crate::catalog::layers::{LayerCategory, LayerRef};
use crate::foundation::core::FrameSize;
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::foundation::math::Fnv1a64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Stable hashed identifier of a resolved asset path.
pub struct AssetId(pub(crate) u64);

impl AssetId {
    /// Construct an [`AssetId`] from raw 64-bit value.
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    /// Access raw 64-bit identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Normalized asset path relative to the asset root, plus its hashed id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetPath {
    pub(crate) rel: String,
    pub(crate) id: AssetId,
}

impl AssetPath {
    /// Normalize `raw` and derive its id.
    pub fn new(raw: &str) -> SpriteResult<Self> {
        let rel = normalize_rel_path(raw)?;
        let id = hash_id_for_path(&rel);
        Ok(Self { rel, id })
    }

    /// Normalized relative path.
    pub fn as_str(&self) -> &str {
        &self.rel
    }

    /// Hashed id used for cache indexing.
    pub fn id(&self) -> AssetId {
        self.id
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rel)
    }
}

/// One layer image to look up.
#[derive(Clone, Copy, Debug)]
pub struct AssetRequest<'a> {
    /// Frame size; first path segment.
    pub size: FrameSize,
    /// Body type. Required for unique base layers, selects body-specific outfit art.
    pub body_type: Option<&'a str>,
    /// Layer to resolve.
    pub layer: LayerRef,
    /// Layer index. For outfit layers 0 is the empty sentinel and never resolves.
    pub index: u32,
    /// Component suffix such as `rear`.
    pub suffix: Option<&'a str>,
}

/// Resolve a layer request to its asset path.
///
/// Layout: `<size>/<base|outfit>/[body/<bodyType>/]<layer>/<NNN>[-<suffix>].png`.
/// Base layers use the body segment only when unique (`body`, `arms`); outfit layers use it when a
/// body type is given.
pub fn resolve(req: &AssetRequest<'_>) -> SpriteResult<AssetPath> {
    let body_type = match req.layer {
        LayerRef::Base(layer) if layer.is_unique() => Some(req.body_type.ok_or_else(|| {
            SpriteError::validation(format!("base layer '{layer}' requires a body type"))
        })?),
        LayerRef::Base(_) => None,
        LayerRef::Outfit(layer) => {
            if req.index == 0 {
                return Err(SpriteError::validation(format!(
                    "outfit layer '{layer}' index 0 means no layer"
                )));
            }
            req.body_type
        }
    };

    let size = req.size.to_string();
    let mut nodes: Vec<&str> = vec![size.as_str(), req.layer.category().dir_name()];
    if let Some(bt) = body_type {
        nodes.push("body");
        nodes.push(bt);
    }
    nodes.push(req.layer.name());

    let mut file = index_string(req.index);
    if let Some(suffix) = req.suffix {
        file.push('-');
        file.push_str(suffix);
    }
    file.push_str(".png");
    nodes.push(&file);

    AssetPath::new(&join_path(&nodes))
}

/// Format a layer index the way asset files are named: `007`, `042`, `150`.
pub fn index_string(idx: u32) -> String {
    if idx < 100 {
        format!("{idx:03}")
    } else {
        idx.to_string()
    }
}

/// Join path nodes, trimming surrounding delimiters and whitespace from each.
pub fn join_path(nodes: &[&str]) -> String {
    let mut path = String::new();
    for node in nodes {
        let node = node.trim().trim_matches('/').trim();
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(node);
    }
    path
}

/// Normalize and validate asset-root-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> SpriteResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(SpriteError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(SpriteError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SpriteError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(SpriteError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

fn hash_id_for_path(norm_path: &str) -> AssetId {
    let mut hasher = Fnv1a64::new_default();
    hasher.write_u8(b'I');
    hasher.write_bytes(norm_path.as_bytes());
    hasher.write_u8(0);
    AssetId(hasher.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/path.rs"]
mod tests;
