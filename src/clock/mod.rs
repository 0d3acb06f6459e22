//! Delay-based scheduling.
//!
//! The machine never sleeps or reads the system time directly; it asks a
//! [`Clock`] to run a callback after a delay and keeps the returned
//! [`TimerHandle`] so the callback can be cancelled.
//!
//! Two implementations are provided:
//! - [`SimulatedClock`]: virtual time, advanced by hand in tests.
//! - [`TokioClock`]: wall-clock time, backed by tokio timers.

mod realtime;
mod simulated;

pub use realtime::TokioClock;
pub use simulated::SimulatedClock;

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Callback run once when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies one scheduled callback on the clock that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) const fn id(self) -> u64 {
        self.0
    }
}

/// Source of time and delayed callbacks.
pub trait Clock: Send + Sync {
    /// Current time as seen by this clock.
    fn now(&self) -> DateTime<Utc>;

    /// Run `callback` once, `delay` from now.
    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancel a scheduled callback.
    ///
    /// Cancelling a handle that already fired or was already cancelled is a no-op.
    fn cancel(&self, handle: TimerHandle);
}

/// Errors creating a clock.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("No tokio runtime is running on this thread")]
    NoRuntime,
}
