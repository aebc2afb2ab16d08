//! Fixed-rate tick schedule.
//!
//! Deadlines sit at `anchor + k * interval`. A deadline that passes while a run is in flight
//! is dropped, never queued, and the schedule moves to the first deadline strictly after
//! the current time. A deadline past the range of `Instant` is treated as never.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Nothing due yet.
    Wait,
    /// Start a run now. `skipped` deadlines passed before this one could be served.
    Run { skipped: u64 },
    /// A run is still in flight; `skipped` deadlines were dropped.
    Skip { skipped: u64 },
}

#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Duration,
    next_deadline: Option<Instant>,
    paused: bool,
}

impl TickSchedule {
    /// The first tick is due at `start`.
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_nanos(1)),
            next_deadline: Some(start),
            paused: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the loop must wake for the next tick; `None` while paused.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.paused {
            None
        } else {
            self.next_deadline
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes with a tick due immediately.
    pub fn resume(&mut self, now: Instant) {
        self.paused = false;
        self.next_deadline = Some(now);
    }

    /// Re-anchors after an out-of-schedule run started at `now`.
    pub fn restart_after(&mut self, now: Instant) {
        self.next_deadline = now.checked_add(self.interval);
    }

    /// Consumes every deadline at or before `now`.
    pub fn poll(&mut self, now: Instant, in_flight: bool) -> TickDecision {
        let Some(deadline) = self.next_deadline.filter(|_| !self.paused) else {
            return TickDecision::Wait;
        };
        if now < deadline {
            return TickDecision::Wait;
        }

        let behind = now.duration_since(deadline).as_nanos();
        let interval = self.interval.as_nanos();
        let passed = behind / interval + 1;
        let advance = interval.saturating_mul(passed);
        self.next_deadline = u64::try_from(advance)
            .ok()
            .and_then(|nanos| deadline.checked_add(Duration::from_nanos(nanos)));

        let passed = passed.min(u64::MAX as u128) as u64;
        if in_flight {
            TickDecision::Skip { skipped: passed }
        } else {
            TickDecision::Run {
                skipped: passed - 1,
            }
        }
    }
}
