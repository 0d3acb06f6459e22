//! Manually driven monitor for tests and demos.

use super::{
    ConnectivityMonitor, EventSink, MonitorError, MonitorSignal, Reachability, SubscriberSlot,
    Subscription,
};
use crate::sync::lock;
use std::sync::{Arc, Mutex};

/// Monitor whose status is pushed by the caller.
///
/// Behaves like a replayable subject: it remembers the last pushed status,
/// replays it to a new subscriber immediately, and forwards every later push.
/// Clones share the same state, so a test can keep one clone while the
/// registry holds another.
///
/// # Example
///
/// ```rust
/// use stoplight::monitor::{ConnectivityMonitor, ControllableMonitor, MonitorSignal, Reachability};
/// use std::sync::{Arc, Mutex};
///
/// let monitor = ControllableMonitor::with_status(Reachability::Unsatisfied);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink_seen = Arc::clone(&seen);
/// let _subscription = monitor
///     .subscribe(Arc::new(move |signal: MonitorSignal| sink_seen.lock().unwrap().push(signal)))
///     .unwrap();
///
/// monitor.push(Reachability::Satisfied);
/// assert_eq!(seen.lock().unwrap().len(), 2);
/// ```
#[derive(Clone)]
pub struct ControllableMonitor {
    current: Arc<Mutex<Option<Reachability>>>,
    slot: Arc<SubscriberSlot>,
}

impl ControllableMonitor {
    /// Monitor with no status yet; subscribers receive nothing until the first push.
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            slot: Arc::new(SubscriberSlot::new("controllable")),
        }
    }

    /// Monitor whose current status is `status`.
    pub fn with_status(status: Reachability) -> Self {
        let monitor = Self::new();
        *lock(&monitor.current) = Some(status);
        monitor
    }

    /// Record `status` and deliver it to the subscriber, if any.
    pub fn push(&self, status: Reachability) {
        *lock(&self.current) = Some(status);
        self.slot.emit(MonitorSignal::from(status));
    }

    /// Deliver a backend fault to the subscriber. The current status is unchanged.
    pub fn push_fault(&self, reason: impl Into<String>) {
        self.slot.emit(MonitorSignal::Fault(reason.into()));
    }

    pub fn current(&self) -> Option<Reachability> {
        *lock(&self.current)
    }

    pub fn has_subscriber(&self) -> bool {
        self.slot.is_attached()
    }
}

impl Default for ControllableMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor for ControllableMonitor {
    fn name(&self) -> &str {
        "controllable"
    }

    fn subscribe(&self, sink: EventSink) -> Result<Subscription, MonitorError> {
        let ticket = self.slot.attach(sink)?;
        if let Some(status) = self.current() {
            self.slot.emit_for(ticket, MonitorSignal::from(status));
        }
        let slot = Arc::clone(&self.slot);
        Ok(Subscription::new(move || slot.detach(ticket)))
    }
}
