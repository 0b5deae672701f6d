//! Time sources for wall-clock driven behavior
//!
//! Scene transitions run for a fixed wall-clock duration. The bridge reads
//! time through the [`Clock`] trait so hosts use the system monotonic clock
//! and tests can step time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Monotonic clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-stepped clock
///
/// Clones share the same time, so a test can keep one clone and hand the
/// other to the bridge.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let delta = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(delta, Ordering::SeqCst);
    }

    /// Move time forward by `seconds`
    ///
    /// Negative, NaN and overflowing amounts leave the clock unchanged.
    pub fn advance_secs(&self, seconds: f32) {
        match Duration::try_from_secs_f32(seconds) {
            Ok(delta) => self.advance(delta),
            Err(err) => log::warn!("Ignoring manual clock step of {seconds}s: {err}"),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
