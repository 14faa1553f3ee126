use std::time::Duration;

use tracing::{trace, warn};

use crate::foundation::core::FrameSize;
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::render::surface::{DstRect, SrcRect, Surface};
use crate::runtime::scheduler::{Scheduler, TimerId, TimerKind};

/// Sheet cells `(col, row)` copied into each strip row, left to right.
///
/// Strip rows hold the south, north and east walk poses; each row is
/// `[standing, left step, right step]`.
pub const STRIP_SLICES: [[(u32, u32); 3]; 3] = [
    [(1, 2), (1, 0), (1, 1)],
    [(0, 2), (0, 0), (0, 1)],
    [(2, 2), (2, 0), (2, 1)],
];

/// Logical frames in one walk cycle.
pub const CYCLE_FRAMES: u8 = 4;

/// Shortest redraw interval a cycler schedules.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Timing of the walk-cycle preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationOpts {
    /// Minimum time a logical frame stays on screen.
    pub frame_delay: Duration,
    /// Redraw interval.
    pub tick_interval: Duration,
}

impl Default for AnimationOpts {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_millis(250),
            tick_interval: Duration::from_nanos(1_000_000_000 / 30),
        }
    }
}

impl AnimationOpts {
    /// Reject redraw intervals below [`MIN_TICK_INTERVAL`].
    pub fn validate(&self) -> SpriteResult<()> {
        if self.tick_interval < MIN_TICK_INTERVAL {
            return Err(SpriteError::validation(format!(
                "tick interval {:?} is below the {MIN_TICK_INTERVAL:?} minimum",
                self.tick_interval
            )));
        }
        Ok(())
    }
}

/// Strip row shown for a logical frame: stand, step, stand, other step.
pub fn strip_row(frame_index: u8) -> u32 {
    match frame_index % CYCLE_FRAMES {
        1 => 1,
        3 => 2,
        _ => 0,
    }
}

/// Rearrange a sheet into the 3x3 walk strip.
pub fn build_strip(sheet: &Surface, cell: FrameSize) -> Surface {
    let (cw, ch) = (cell.width, cell.height);
    let mut strip = Surface::new(cw * 3, ch * 3);
    for (row, cells) in (0u32..).zip(STRIP_SLICES.iter()) {
        for (col, &(sx, sy)) in (0u32..).zip(cells.iter()) {
            strip.copy(
                sheet,
                SrcRect {
                    x: sx * cw,
                    y: sy * ch,
                    w: cw,
                    h: ch,
                },
                DstRect {
                    x: i64::from(col * cw),
                    y: i64::from(row * ch),
                    w: cw,
                    h: ch,
                },
            );
        }
    }
    strip
}

/// Walk-cycle preview driven by scheduler ticks.
///
/// Frames advance on `frame_delay`, redraws happen on every tick. At most one tick timer is
/// pending at any time.
#[derive(Debug)]
pub struct AnimationCycler {
    opts: AnimationOpts,
    cell: FrameSize,
    strip: Option<Surface>,
    preview: Option<Surface>,
    frame_index: u8,
    last_change: Duration,
    timer: Option<TimerId>,
    redraws: u64,
    rate_window: (Duration, u32),
    redraw_rate: Option<f64>,
}

impl AnimationCycler {
    /// Idle cycler. A tick interval below [`MIN_TICK_INTERVAL`] is raised to it.
    pub fn new(opts: AnimationOpts) -> Self {
        if let Err(e) = opts.validate() {
            warn!(error = %e, "clamping animation tick interval");
        }
        let opts = AnimationOpts {
            tick_interval: opts.tick_interval.max(MIN_TICK_INTERVAL),
            ..opts
        };
        Self {
            opts,
            cell: FrameSize {
                width: 1,
                height: 1,
            },
            strip: None,
            preview: None,
            frame_index: 0,
            last_change: Duration::ZERO,
            timer: None,
            redraws: 0,
            rate_window: (Duration::ZERO, 0),
            redraw_rate: None,
        }
    }

    /// Start cycling over `sheet`, whose cells are `cell` sized. Stops a running cycle first.
    pub fn start(
        &mut self,
        sheet: &Surface,
        cell: FrameSize,
        scheduler: &mut Scheduler<TimerKind>,
        now: Duration,
    ) {
        self.stop(scheduler);

        self.cell = cell;
        self.strip = Some(build_strip(sheet, cell));
        self.preview = Some(Surface::new(cell.width * 3, cell.height));
        self.frame_index = 0;
        self.last_change = now;
        self.rate_window = (now, 0);
        self.redraw();
        let next = now + self.opts.tick_interval;
        self.timer = Some(scheduler.schedule(next, TimerKind::AnimationTick));
    }

    /// Cancel the pending tick and drop the strip and preview. Safe when idle.
    pub fn stop(&mut self, scheduler: &mut Scheduler<TimerKind>) {
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
        self.strip = None;
        self.preview = None;
        self.frame_index = 0;
    }

    /// Handle a fired tick. Returns `false` for a timer this cycler no longer owns.
    pub fn on_tick(
        &mut self,
        timer: TimerId,
        now: Duration,
        scheduler: &mut Scheduler<TimerKind>,
    ) -> bool {
        if self.timer != Some(timer) {
            return false;
        }

        if now.saturating_sub(self.last_change) >= self.opts.frame_delay {
            self.frame_index = (self.frame_index + 1) % CYCLE_FRAMES;
            self.last_change = now;
            if let Some(preview) = self.preview.as_mut() {
                preview.clear();
            }
        }
        self.redraw();
        self.measure(now);

        let next = now + self.opts.tick_interval;
        self.timer = Some(scheduler.schedule(next, TimerKind::AnimationTick));
        true
    }

    fn redraw(&mut self) {
        let (Some(strip), Some(preview)) = (self.strip.as_ref(), self.preview.as_mut()) else {
            return;
        };
        let row = strip_row(self.frame_index);
        let (w, h) = (self.cell.width * 3, self.cell.height);
        preview.copy(
            strip,
            SrcRect {
                x: 0,
                y: row * h,
                w,
                h,
            },
            DstRect { x: 0, y: 0, w, h },
        );
        self.redraws += 1;
        self.rate_window.1 += 1;
    }

    fn measure(&mut self, now: Duration) {
        let (since, count) = self.rate_window;
        let elapsed = now.saturating_sub(since);
        if elapsed < Duration::from_secs(1) {
            return;
        }
        let rate = f64::from(count) / elapsed.as_secs_f64();
        trace!(fps = rate, "animation redraw rate");
        self.redraw_rate = Some(rate);
        self.rate_window = (now, 0);
    }

    /// A tick timer is pending.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Current logical frame, `0..4`.
    pub fn frame_index(&self) -> u8 {
        self.frame_index
    }

    /// Preview surface: one strip row, `3 * cell.width` by `cell.height`.
    pub fn preview(&self) -> Option<&Surface> {
        self.preview.as_ref()
    }

    /// The 3x3 strip built from the last sheet.
    pub fn strip(&self) -> Option<&Surface> {
        self.strip.as_ref()
    }

    /// Redraws since creation.
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Redraws per second over the last full measuring window.
    pub fn redraw_rate(&self) -> Option<f64> {
        self.redraw_rate
    }

    /// Timing in use.
    pub fn opts(&self) -> AnimationOpts {
        self.opts
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/animation.rs"]
mod tests;
