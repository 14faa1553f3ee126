use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Identifier of a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Timers driven by the generator session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Redraw the walk-cycle preview.
    AnimationTick,
    /// Abandon the loads of a render that has not completed.
    LoadTimeout {
        /// Render the timeout belongs to.
        generation: u64,
    },
}

/// One-shot timers on a virtual clock.
///
/// Deadlines are offsets from the owner's clock origin. Timers with equal deadlines fire in
/// scheduling order. Cancelled timers are dropped lazily from the heap.
#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    payloads: HashMap<u64, T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            heap: BinaryHeap::new(),
            payloads: HashMap::new(),
        }
    }

    /// Schedule `payload` to become due at `at`.
    pub fn schedule(&mut self, at: Duration, payload: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((at, id)));
        self.payloads.insert(id, payload);
        TimerId(id)
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.payloads.remove(&id.0).is_some()
    }

    /// The timer is still pending.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.payloads.contains_key(&id.0)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((at, _))| *at)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, T)> {
        self.discard_cancelled();
        let Reverse((at, id)) = *self.heap.peek()?;
        if at > now {
            return None;
        }
        self.heap.pop();
        let payload = self.payloads.remove(&id)?;
        Some((TimerId(id), payload))
    }

    /// Pending timers.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// No timers pending.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.payloads.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/scheduler.rs"]
mod tests;
