// Frame scheduling: one-shot "call me before the next frame" callbacks.
//
// `FrameQueue` is driven by the host's frame presentation (the TUI draw
// loop). `IntervalScheduler` is the fixed-interval fallback for hosts with
// no presentation hook. Both hold callbacks until the host pumps them, so a
// callback never runs from inside `request_frame`.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Receives a timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;
    /// Drop a pending callback. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Fallback interval, roughly 60 frames per second.
pub const FALLBACK_FRAME_INTERVAL: Duration = Duration::from_millis(16);

// ── Presentation-driven queue ────────────────────────────────────────────────

#[derive(Default)]
pub struct FrameQueue {
    next_id: Cell<u64>,
    pending: RefCell<Vec<(FrameHandle, FrameCallback)>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run every callback queued before this call. Callbacks queued while
    /// running wait for the next presentation.
    pub fn present(&self, timestamp_ms: f64) -> usize {
        let due: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        let count = due.len();
        for (_, callback) in due {
            callback(timestamp_ms);
        }
        count
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = FrameHandle(id);
        self.pending.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

// ── Fixed-interval fallback ──────────────────────────────────────────────────

pub struct IntervalScheduler {
    interval: Duration,
    origin: Instant,
    next_id: Cell<u64>,
    pending: RefCell<Vec<(FrameHandle, Instant, FrameCallback)>>,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new(FALLBACK_FRAME_INTERVAL)
    }
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            origin: Instant::now(),
            next_id: Cell::new(0),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Earliest deadline among pending callbacks.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.borrow().iter().map(|(_, due, _)| *due).min()
    }

    /// Run callbacks whose deadline has passed.
    pub fn run_due(&self, now: Instant) -> usize {
        let due: Vec<_> = {
            let mut pending = self.pending.borrow_mut();
            let (ready, waiting): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|(_, at, _)| *at <= now);
            *pending = waiting;
            ready
        };
        let count = due.len();
        let timestamp = now.saturating_duration_since(self.origin).as_secs_f64() * 1000.0;
        for (_, _, callback) in due {
            callback(timestamp);
        }
        count
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = FrameHandle(id);
        let due = Instant::now() + self.interval;
        self.pending.borrow_mut().push((handle, due, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|(h, _, _)| *h != handle);
    }
}
