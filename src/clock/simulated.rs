//! Manually advanced virtual clock.

use super::{Clock, TimerCallback, TimerHandle};
use crate::sync::lock;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

/// Virtual clock for deterministic tests.
///
/// Time only moves when [`advance`](SimulatedClock::advance) is called.
/// Advancing first moves virtual time forward, then fires every callback
/// that was already pending and is now due, in deadline order (ties in
/// scheduling order). Callbacks scheduled while advancing are measured
/// from the new virtual time and wait for a later advance.
///
/// # Example
///
/// ```rust
/// use stoplight::clock::{Clock, SimulatedClock};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = SimulatedClock::new();
/// let fired = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&fired);
/// clock.schedule_after(
///     Duration::from_millis(2000),
///     Box::new(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }),
/// );
///
/// clock.advance(Duration::from_millis(1999));
/// assert_eq!(fired.load(Ordering::SeqCst), 0);
/// clock.advance(Duration::from_millis(1));
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct SimulatedClock {
    inner: Mutex<Inner>,
}

struct Inner {
    epoch: DateTime<Utc>,
    elapsed: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), TimerCallback>,
    deadlines: HashMap<u64, Duration>,
}

impl SimulatedClock {
    /// Virtual clock starting at the Unix epoch.
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::default())
    }

    /// Virtual clock whose time zero is `epoch`.
    pub fn starting_at(epoch: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                epoch,
                elapsed: Duration::ZERO,
                next_id: 0,
                pending: BTreeMap::new(),
                deadlines: HashMap::new(),
            }),
        }
    }

    /// Move virtual time forward and fire the callbacks that became due.
    pub fn advance(&self, delta: Duration) {
        let due: Vec<(Duration, u64)> = {
            let mut inner = lock(&self.inner);
            inner.elapsed += delta;
            let now = inner.elapsed;
            inner
                .pending
                .range(..=(now, u64::MAX))
                .map(|(key, _)| *key)
                .collect()
        };

        for key in due {
            // The lock is released before running the callback so that it
            // can schedule or cancel timers on this clock.
            let callback = {
                let mut inner = lock(&self.inner);
                inner.deadlines.remove(&key.1);
                inner.pending.remove(&key)
            };
            if let Some(callback) = callback {
                debug!("simulated clock firing timer {} due at {:?}", key.1, key.0);
                callback();
            }
        }
    }

    /// Shorthand for `advance(Duration::from_millis(ms))`.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Virtual time elapsed since the epoch.
    pub fn elapsed(&self) -> Duration {
        lock(&self.inner).elapsed
    }

    /// Number of callbacks scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        lock(&self.inner).pending.len()
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        let inner = lock(&self.inner);
        let elapsed_ms = i64::try_from(inner.elapsed.as_millis()).unwrap_or(i64::MAX);
        inner.epoch + chrono::Duration::milliseconds(elapsed_ms)
    }

    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        let deadline = inner.elapsed + delay;
        inner.pending.insert((deadline, id), callback);
        inner.deadlines.insert(id, deadline);
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut inner = lock(&self.inner);
        if let Some(deadline) = inner.deadlines.remove(&handle.id()) {
            inner.pending.remove(&(deadline, handle.id()));
        }
    }
}
