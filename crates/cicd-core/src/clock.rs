// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Time abstraction so scheduling, liveness, and timeout logic can be
//! driven deterministically in tests instead of sleeping on wall time.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// A source of "now", injectable so tests can control time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for deadlines and interval ticks.
    fn now(&self) -> Instant;
    /// Wall-clock time, used for persisted timestamps.
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually advanced clock for deterministic tests.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: std::sync::Arc<Mutex<FakeClockState>>,
}

#[derive(Debug)]
struct FakeClockState {
    instant: Instant,
    utc: DateTime<Utc>,
}

impl FakeClock {
    /// Creates a fake clock anchored at the current real time.
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(FakeClockState {
                instant: Instant::now(),
                utc: Utc::now(),
            })),
        }
    }

    /// Advances both the monotonic and wall-clock readings by `d`.
    pub fn advance(&self, d: Duration) {
        let mut state = self.inner.lock();
        state.instant += d;
        state.utc += chrono::Duration::from_std(d).unwrap_or_default();
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.inner.lock().utc
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
