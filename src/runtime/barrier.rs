use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::assets::cache::ImageHandle;

type CompleteFn = Box<dyn FnOnce(&[ImageHandle])>;
type FailureFn = Box<dyn FnOnce(&ImageHandle)>;

struct JoinState {
    handles: Vec<ImageHandle>,
    // Per-join flags; nothing is shared between joins.
    fired: Cell<bool>,
    failed: Cell<bool>,
    cancelled: Cell<bool>,
    on_complete: RefCell<Option<CompleteFn>>,
    on_failure: RefCell<Option<FailureFn>>,
}

impl JoinState {
    fn is_settled(&self) -> bool {
        self.fired.get() || self.failed.get() || self.cancelled.get()
    }

    fn check(&self) {
        if self.is_settled() {
            return;
        }

        if let Some(bad) = self.handles.iter().find(|h| h.is_failed()) {
            self.failed.set(true);
            self.on_complete.borrow_mut().take();
            let cb = self.on_failure.borrow_mut().take();
            if let Some(cb) = cb {
                cb(bad);
            }
            return;
        }

        if self.handles.iter().all(ImageHandle::is_ready) {
            self.fired.set(true);
            self.on_failure.borrow_mut().take();
            let cb = self.on_complete.borrow_mut().take();
            if let Some(cb) = cb {
                cb(&self.handles);
            }
        }
    }
}

/// Join over many image loads with single-fire completion.
pub struct LoadBarrier;

impl LoadBarrier {
    /// Call `on_complete` once every handle is loaded with non-zero dimensions.
    ///
    /// Handles that are already loaded count immediately; if all are, `on_complete` runs before
    /// `join` returns. It never runs twice for the same join.
    pub fn join(
        handles: Vec<ImageHandle>,
        on_complete: impl FnOnce(&[ImageHandle]) + 'static,
    ) -> JoinToken {
        Self::join_with_failure(handles, on_complete, |_| {})
    }

    /// Like [`LoadBarrier::join`], but reports the first failed handle through `on_failure`.
    ///
    /// Exactly one of the two callbacks runs, at most once, unless the join is cancelled first.
    pub fn join_with_failure(
        handles: Vec<ImageHandle>,
        on_complete: impl FnOnce(&[ImageHandle]) + 'static,
        on_failure: impl FnOnce(&ImageHandle) + 'static,
    ) -> JoinToken {
        let state = Rc::new(JoinState {
            handles,
            fired: Cell::new(false),
            failed: Cell::new(false),
            cancelled: Cell::new(false),
            on_complete: RefCell::new(Some(Box::new(on_complete))),
            on_failure: RefCell::new(Some(Box::new(on_failure))),
        });

        for handle in &state.handles {
            let waiter = Rc::clone(&state);
            handle.when_settled(Box::new(move || waiter.check()));
        }
        state.check();

        JoinToken { state }
    }
}

/// Observer and cancellation handle of one join.
#[derive(Clone)]
pub struct JoinToken {
    state: Rc<JoinState>,
}

impl JoinToken {
    /// `on_complete` has run.
    pub fn is_fired(&self) -> bool {
        self.state.fired.get()
    }

    /// A handle failed and `on_failure` has run.
    pub fn is_failed(&self) -> bool {
        self.state.failed.get()
    }

    /// Neither fired, failed nor cancelled yet.
    pub fn is_pending(&self) -> bool {
        !self.state.is_settled()
    }

    /// Drop both callbacks; later load events are ignored.
    pub fn cancel(&self) {
        if self.state.is_settled() {
            return;
        }
        self.state.cancelled.set(true);
        self.state.on_complete.borrow_mut().take();
        self.state.on_failure.borrow_mut().take();
    }

    /// Handles being joined, in join order.
    pub fn handles(&self) -> &[ImageHandle] {
        &self.state.handles
    }
}

impl fmt::Debug for JoinToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinToken")
            .field("handles", &self.state.handles.len())
            .field("fired", &self.state.fired.get())
            .field("failed", &self.state.failed.get())
            .field("cancelled", &self.state.cancelled.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/barrier.rs"]
mod tests;
