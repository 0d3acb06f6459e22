//! Wall-clock scheduling on a tokio runtime.

use super::{Clock, ClockError, TimerCallback, TimerHandle};
use crate::sync::lock;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

type TimerTasks = Arc<Mutex<HashMap<u64, JoinHandle<()>>>>;

/// Clock backed by tokio timers.
///
/// Each scheduled callback is a task that sleeps for the delay and then runs
/// the callback; cancelling aborts the task. The callback runs on a runtime
/// worker, so it must not block.
pub struct TokioClock {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: TimerTasks,
}

impl TokioClock {
    /// Clock bound to the runtime of the calling context.
    pub fn new() -> Result<Self, ClockError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|_| ClockError::NoRuntime)
    }

    /// Clock bound to an explicit runtime.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of timers scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(&self.tasks);

        // Held across spawn so the task cannot look itself up before it is registered.
        let mut registered = lock(&self.tasks);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let still_pending = lock(&tasks).remove(&id).is_some();
            if still_pending {
                callback();
            }
        });
        registered.insert(id, task);
        debug!("tokio clock scheduled timer {id} in {delay:?}");
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = lock(&self.tasks).remove(&handle.id()) {
            task.abort();
        }
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        for (_, task) in lock(&self.tasks).drain() {
            task.abort();
        }
    }
}
