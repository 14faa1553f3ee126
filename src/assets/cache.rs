use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::path::{AssetId, AssetPath};
use crate::assets::source::AssetSource;
use crate::foundation::error::SpriteResult;

/// Load progress of an image resource.
#[derive(Clone, Debug)]
pub enum LoadState {
    /// Queued or in flight.
    Loading,
    /// Decoded and ready to draw.
    Loaded(PreparedImage),
    /// Reading or decoding failed; the message is kept for reporting.
    Failed(String),
}

struct ImageResource {
    path: AssetPath,
    state: RefCell<LoadState>,
    waiters: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Shared handle to a cached image; clones refer to the same resource.
#[derive(Clone)]
pub struct ImageHandle(Rc<ImageResource>);

impl ImageHandle {
    pub(crate) fn new_pending(path: AssetPath) -> Self {
        Self(Rc::new(ImageResource {
            path,
            state: RefCell::new(LoadState::Loading),
            waiters: RefCell::new(Vec::new()),
        }))
    }

    /// Resolved asset path.
    pub fn path(&self) -> &AssetPath {
        &self.0.path
    }

    /// Snapshot of the load state.
    pub fn state(&self) -> LoadState {
        self.0.state.borrow().clone()
    }

    /// Still waiting for its load.
    pub fn is_loading(&self) -> bool {
        matches!(*self.0.state.borrow(), LoadState::Loading)
    }

    /// Loaded with non-zero dimensions.
    pub fn is_ready(&self) -> bool {
        match &*self.0.state.borrow() {
            LoadState::Loaded(img) => img.width > 0 && img.height > 0,
            _ => false,
        }
    }

    /// Load failed.
    pub fn is_failed(&self) -> bool {
        matches!(*self.0.state.borrow(), LoadState::Failed(_))
    }

    /// Decoded image, once loaded.
    pub fn image(&self) -> Option<PreparedImage> {
        match &*self.0.state.borrow() {
            LoadState::Loaded(img) => Some(img.clone()),
            _ => None,
        }
    }

    /// Identity comparison: both handles refer to the same cached resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Run `f` once when the load settles. Returns `false` (dropping `f`) if it already has.
    pub(crate) fn when_settled(&self, f: Box<dyn FnOnce()>) -> bool {
        if !self.is_loading() {
            return false;
        }
        self.0.waiters.borrow_mut().push(f);
        true
    }

    /// Store the load outcome and wake every waiter. Later outcomes are ignored.
    pub(crate) fn settle(&self, result: SpriteResult<PreparedImage>) {
        {
            let mut state = self.0.state.borrow_mut();
            if !matches!(*state, LoadState::Loading) {
                return;
            }
            *state = match result {
                Ok(img) => LoadState::Loaded(img),
                Err(e) => LoadState::Failed(e.to_string()),
            };
        }
        let waiters = std::mem::take(&mut *self.0.waiters.borrow_mut());
        for waiter in waiters {
            waiter();
        }
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.0.state.borrow() {
            LoadState::Loading => "loading",
            LoadState::Loaded(_) => "loaded",
            LoadState::Failed(_) => "failed",
        };
        f.debug_struct("ImageHandle")
            .field("path", &self.0.path.as_str())
            .field("state", &state)
            .field("ptr", &Rc::as_ptr(&self.0))
            .finish()
    }
}

/// Process-lifetime image cache keyed by resolved asset path.
///
/// Handles are returned immediately in [`LoadState::Loading`] and loaded by [`ImageCache::pump`].
/// Entries are never evicted; the asset catalog bounds the cache size.
pub struct ImageCache {
    source: Box<dyn AssetSource>,
    // Buckets by hashed id; the exact path is compared on every hit.
    entries: HashMap<AssetId, Vec<ImageHandle>>,
    queue: VecDeque<ImageHandle>,
    load_counts: HashMap<String, u32>,
}

impl ImageCache {
    /// Cache reading assets through `source`.
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            entries: HashMap::new(),
            queue: VecDeque::new(),
            load_counts: HashMap::new(),
        }
    }

    /// Existing handle for `path`, if any.
    pub fn get(&self, path: &AssetPath) -> Option<ImageHandle> {
        self.entries
            .get(&path.id())?
            .iter()
            .find(|h| h.path().as_str() == path.as_str())
            .cloned()
    }

    /// Existing handle for `path`, or a new one queued for loading.
    pub fn get_or_create(&mut self, path: &AssetPath) -> ImageHandle {
        if let Some(handle) = self.get(path) {
            return handle;
        }
        let handle = ImageHandle::new_pending(path.clone());
        self.entries
            .entry(path.id())
            .or_default()
            .push(handle.clone());
        self.queue.push_back(handle.clone());
        handle
    }

    /// Perform the oldest queued load. Returns `false` when nothing was queued.
    pub fn pump_one(&mut self) -> bool {
        let Some(handle) = self.queue.pop_front() else {
            return false;
        };
        let path = handle.path().clone();
        *self.load_counts.entry(path.as_str().to_string()).or_insert(0) += 1;

        let result = self.source.read(&path).and_then(|bytes| decode_image(&bytes));
        match &result {
            Ok(img) => tracing::debug!(path = %path, w = img.width, h = img.height, "image loaded"),
            Err(e) => tracing::warn!(path = %path, error = %e, "image failed to load"),
        }
        handle.settle(result);
        true
    }

    /// Perform every load queued at call time. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let n = self.queue.len();
        for _ in 0..n {
            self.pump_one();
        }
        n
    }

    /// Loads still queued.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of cached resources.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether nothing was ever requested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How often the resource at `path` was read and decoded.
    pub fn load_count(&self, path: &AssetPath) -> u32 {
        self.load_counts.get(path.as_str()).copied().unwrap_or(0)
    }
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.len())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
