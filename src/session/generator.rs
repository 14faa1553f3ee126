use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::assets::cache::ImageCache;
use crate::assets::source::AssetSource;
use crate::catalog::model::LayerCatalog;
use crate::foundation::core::FrameSize;
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::layering::builder::{LayerDrawRequest, build};
use crate::render::animation::{AnimationCycler, AnimationOpts};
use crate::render::compositor::composite;
use crate::render::surface::Surface;
use crate::runtime::barrier::{JoinToken, LoadBarrier};
use crate::runtime::scheduler::{Scheduler, TimerId, TimerKind};
use crate::selection::SelectionState;

/// Timing knobs of a generator session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorOpts {
    /// Walk-cycle timing.
    pub animation: AnimationOpts,
    /// How long a render may wait for its images before it is abandoned.
    ///
    /// [`SpriteGenerator::advance`] settles every queued load before it fires timers, so with the
    /// synchronous [`AssetSource`]s in this crate a render always completes or fails first.
    pub load_timeout: Duration,
    /// Force upscaled output regardless of the selection.
    pub upscale: bool,
}

impl Default for GeneratorOpts {
    fn default() -> Self {
        Self {
            animation: AnimationOpts::default(),
            load_timeout: Duration::from_secs(5),
            upscale: false,
        }
    }
}

/// Where the latest render stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// Nothing requested yet.
    Idle,
    /// Waiting for images of this render.
    Loading {
        /// Render number.
        generation: u64,
    },
    /// The sheet of this render is current.
    Ready {
        /// Render number.
        generation: u64,
    },
    /// This render was abandoned; the previous sheet is still shown.
    Stalled {
        /// Render number.
        generation: u64,
    },
}

#[derive(Debug)]
enum LoadEvent {
    Complete { generation: u64 },
    Failed { generation: u64, path: String },
}

impl LoadEvent {
    fn generation(&self) -> u64 {
        match self {
            Self::Complete { generation } | Self::Failed { generation, .. } => *generation,
        }
    }
}

struct PendingRender {
    selection: SelectionState,
    requests: Vec<LayerDrawRequest>,
    join: JoinToken,
    timeout: TimerId,
}

/// One sprite-generator session.
///
/// Owns the catalog, image cache, virtual clock, sheet and walk-cycle preview. Renders complete
/// asynchronously: [`SpriteGenerator::render`] queues the loads and [`SpriteGenerator::advance`]
/// performs them, composites and drives the animation.
pub struct SpriteGenerator {
    catalog: LayerCatalog,
    cache: ImageCache,
    scheduler: Scheduler<TimerKind>,
    animation: AnimationCycler,
    opts: GeneratorOpts,
    clock: Duration,
    generation: u64,
    // Barrier callbacks post here; only events of the current generation are acted upon.
    mailbox: Rc<RefCell<VecDeque<LoadEvent>>>,
    pending: Option<PendingRender>,
    status: RenderStatus,
    last_error: Option<SpriteError>,
    sheet: Option<Surface>,
    sheet_cell: FrameSize,
    current: Option<SelectionState>,
}

impl SpriteGenerator {
    /// New idle session.
    pub fn new(
        catalog: LayerCatalog,
        source: impl AssetSource + 'static,
        opts: GeneratorOpts,
    ) -> Self {
        Self {
            catalog,
            cache: ImageCache::new(source),
            scheduler: Scheduler::new(),
            animation: AnimationCycler::new(opts.animation),
            opts,
            clock: Duration::ZERO,
            generation: 0,
            mailbox: Rc::new(RefCell::new(VecDeque::new())),
            pending: None,
            status: RenderStatus::Idle,
            last_error: None,
            sheet: None,
            sheet_cell: FrameSize {
                width: 1,
                height: 1,
            },
            current: None,
        }
    }

    /// Request a sheet for `selection`.
    ///
    /// Invalid selections and catalog problems are returned immediately and leave the current
    /// sheet, animation and any render in flight untouched. Otherwise the previous render is
    /// superseded and its generation number is returned. When every image is already cached the
    /// sheet is composited before this returns.
    #[tracing::instrument(skip_all, fields(size = %selection.size, body = %selection.body_type))]
    pub fn render(&mut self, selection: SelectionState) -> SpriteResult<u64> {
        let requests = match selection
            .validate(&self.catalog)
            .and_then(|()| build(&selection, &self.catalog, &mut self.cache))
        {
            Ok(requests) => requests,
            Err(e) => {
                warn!(error = %e, "selection rejected; keeping previous sheet");
                return Err(e);
            }
        };

        self.supersede();
        self.generation += 1;
        let generation = self.generation;
        self.animation.stop(&mut self.scheduler);

        let timeout = self.scheduler.schedule(
            self.clock + self.opts.load_timeout,
            TimerKind::LoadTimeout { generation },
        );
        let done = Rc::clone(&self.mailbox);
        let failed = Rc::clone(&self.mailbox);
        let join = LoadBarrier::join_with_failure(
            requests.iter().map(|r| r.image.clone()).collect(),
            move |_| done.borrow_mut().push_back(LoadEvent::Complete { generation }),
            move |bad| {
                failed.borrow_mut().push_back(LoadEvent::Failed {
                    generation,
                    path: bad.path().to_string(),
                })
            },
        );

        debug!(generation, layers = requests.len(), "render requested");
        self.pending = Some(PendingRender {
            selection,
            requests,
            join,
            timeout,
        });
        self.status = RenderStatus::Loading { generation };
        self.drain_mailbox()?;
        Ok(generation)
    }

    /// Move the virtual clock forward by `dt`.
    ///
    /// Performs queued image loads, finishes or abandons the pending render, then fires every
    /// timer that falls due, in deadline order.
    pub fn advance(&mut self, dt: Duration) -> SpriteResult<()> {
        let loaded = self.cache.pump();
        if loaded > 0 {
            debug!(loaded, "pumped image loads");
        }
        self.drain_mailbox()?;
        self.run_timers_until(self.clock + dt)
    }

    fn run_timers_until(&mut self, target: Duration) -> SpriteResult<()> {
        while let Some(at) = self.scheduler.next_deadline() {
            if at > target {
                break;
            }
            self.clock = self.clock.max(at);
            let Some((id, kind)) = self.scheduler.pop_due(self.clock) else {
                break;
            };
            match kind {
                TimerKind::AnimationTick => {
                    self.animation.on_tick(id, self.clock, &mut self.scheduler);
                }
                TimerKind::LoadTimeout { generation } => {
                    let timed_out = self
                        .pending
                        .as_ref()
                        .is_some_and(|p| p.timeout == id && generation == self.generation);
                    if timed_out {
                        self.stall(SpriteError::asset_load(format!(
                            "images did not load within {:?}",
                            self.opts.load_timeout
                        )));
                    }
                }
            }
        }
        self.clock = self.clock.max(target);
        Ok(())
    }

    fn next_event(&self) -> Option<LoadEvent> {
        self.mailbox.borrow_mut().pop_front()
    }

    fn drain_mailbox(&mut self) -> SpriteResult<()> {
        while let Some(event) = self.next_event() {
            if event.generation() != self.generation {
                debug!(?event, current = self.generation, "ignoring stale load event");
                continue;
            }
            match event {
                LoadEvent::Complete { .. } => self.finish()?,
                LoadEvent::Failed { path, .. } => {
                    self.stall(SpriteError::asset_load(format!("failed to load '{path}'")));
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> SpriteResult<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        self.scheduler.cancel(pending.timeout);

        let upscale = pending.selection.upscale || self.opts.upscale;
        let frame = pending.selection.size;
        let sheet = composite(&pending.requests, frame, upscale)?;
        let cell = frame.scaled(if upscale { 2 } else { 1 });

        self.animation.start(&sheet, cell, &mut self.scheduler, self.clock);
        self.sheet = Some(sheet);
        self.sheet_cell = cell;
        self.current = Some(pending.selection);
        self.last_error = None;
        self.status = RenderStatus::Ready {
            generation: self.generation,
        };
        info!(generation = self.generation, "sheet composited");
        Ok(())
    }

    // Abandon the pending render and fall back to the previous sheet.
    fn stall(&mut self, error: SpriteError) {
        self.supersede();
        warn!(
            generation = self.generation,
            error = %error,
            "render abandoned; keeping previous sheet"
        );
        if let Some(sheet) = self.sheet.as_ref() {
            self.animation.start(sheet, self.sheet_cell, &mut self.scheduler, self.clock);
        }
        self.last_error = Some(error);
        self.status = RenderStatus::Stalled {
            generation: self.generation,
        };
    }

    fn supersede(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.join.cancel();
            self.scheduler.cancel(pending.timeout);
        }
    }

    /// Encode the current sheet as PNG bytes.
    pub fn build_png(&self) -> SpriteResult<Vec<u8>> {
        self.sheet
            .as_ref()
            .ok_or_else(|| SpriteError::validation("no sheet has been rendered yet"))?
            .to_png()
    }

    /// State of the latest render.
    pub fn status(&self) -> &RenderStatus {
        &self.status
    }

    /// Why the latest render was abandoned, if it was.
    pub fn last_error(&self) -> Option<&SpriteError> {
        self.last_error.as_ref()
    }

    /// Current sheet.
    pub fn sheet(&self) -> Option<&Surface> {
        self.sheet.as_ref()
    }

    /// Current walk-cycle preview.
    pub fn preview(&self) -> Option<&Surface> {
        self.animation.preview()
    }

    /// The walk-cycle preview driver.
    pub fn animation(&self) -> &AnimationCycler {
        &self.animation
    }

    /// Selection the current sheet was rendered from.
    pub fn current_selection(&self) -> Option<&SelectionState> {
        self.current.as_ref()
    }

    /// Layer catalog in use.
    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    /// Image cache shared by every render.
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Latest generation number; 0 before the first render.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Virtual time since the session started.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Session options.
    pub fn opts(&self) -> GeneratorOpts {
        self.opts
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/generator.rs"]
mod tests;
