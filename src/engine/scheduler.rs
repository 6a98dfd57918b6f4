//! Frame scheduling: the animation-frame abstraction the animator runs on.
//!
//! A scheduler hands out at most one pending frame at a time. The animator
//! requests a frame at the end of each callback, and cancelling the pending
//! handle guarantees no further callbacks.

use std::thread;
use std::time::{Duration, Instant};

pub type FrameHandle = u64;

/// One fired frame callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    pub handle: FrameHandle,
    /// Seconds on the scheduler's clock.
    pub timestamp: f64,
}

pub trait FrameScheduler {
    /// Ask for a frame callback. While one is already pending its handle is
    /// returned again.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel `handle` if it is the pending frame.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Wait for the pending frame to fire. `None` when nothing is pending.
    fn wait_frame(&mut self) -> Option<FrameTick>;

    /// Current time on the scheduler's clock, seconds.
    fn now(&self) -> f64;

    fn has_pending(&self) -> bool;
}

/// Deterministic scheduler for tests and offline rendering: every frame
/// advances the clock by a fixed step.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: f64,
    step: f64,
    stall: f64,
    pending: Option<FrameHandle>,
    next_handle: FrameHandle,
    fired: u64,
}

impl ManualScheduler {
    /// Frames `1 / fps` seconds apart, starting at `t = 0`.
    pub fn new(fps: f64) -> Self {
        let step = if fps.is_finite() && fps > 0.0 { 1.0 / fps } else { 1.0 / 60.0 };
        Self::with_step(step)
    }

    pub fn with_step(step: f64) -> Self {
        Self {
            now: 0.0,
            step: step.max(0.0),
            stall: 0.0,
            pending: None,
            next_handle: 1,
            fired: 0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Delay the next frame by `secs`, as if the host dropped frames.
    pub fn stall(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.stall += secs;
        }
    }

    /// Move the clock without firing a frame.
    pub fn advance(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.now += secs;
        }
    }

    /// Frames fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        if let Some(handle) = self.pending {
            return handle;
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn wait_frame(&mut self) -> Option<FrameTick> {
        let handle = self.pending.take()?;
        self.now += self.step + std::mem::take(&mut self.stall);
        self.fired += 1;
        Some(FrameTick {
            handle,
            timestamp: self.now,
        })
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Real-clock scheduler: sleeps until the next frame boundary. When behind
/// it fires immediately and re-anchors instead of bursting to catch up.
#[derive(Debug)]
pub struct IntervalScheduler {
    start: Instant,
    interval: Duration,
    next_due: Instant,
    pending: Option<FrameHandle>,
    next_handle: FrameHandle,
}

impl IntervalScheduler {
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        let start = Instant::now();
        Self {
            start,
            interval: Duration::from_secs_f64(1.0 / fps),
            next_due: start,
            pending: None,
            next_handle: 1,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        if let Some(handle) = self.pending {
            return handle;
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn wait_frame(&mut self) -> Option<FrameTick> {
        let handle = self.pending.take()?;
        let now = Instant::now();
        if self.next_due > now {
            thread::sleep(self.next_due - now);
        }
        let fired_at = Instant::now();
        self.next_due += self.interval;
        if self.next_due < fired_at {
            log::trace!("frame scheduler behind by {:?}, skipping", fired_at - self.next_due);
            self.next_due = fired_at + self.interval;
        }
        Some(FrameTick {
            handle,
            timestamp: fired_at.duration_since(self.start).as_secs_f64(),
        })
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
