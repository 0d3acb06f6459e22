//! Monitors pinned to one status.

use super::{
    ConnectivityMonitor, EventSink, MonitorError, MonitorSignal, Reachability, SubscriberSlot,
    Subscription,
};
use std::sync::Arc;

/// Monitor that always reports the same status.
///
/// On subscribe it emits its pinned status once, then stays silent. Used to
/// pin a machine to "internet always on" or "always off".
pub struct FixedMonitor {
    status: Reachability,
    slot: Arc<SubscriberSlot>,
}

impl FixedMonitor {
    pub fn new(status: Reachability) -> Self {
        let name = match status {
            Reachability::Satisfied => "fixed-satisfied",
            Reachability::Unsatisfied => "fixed-unsatisfied",
        };
        Self {
            status,
            slot: Arc::new(SubscriberSlot::new(name)),
        }
    }

    pub fn satisfied() -> Self {
        Self::new(Reachability::Satisfied)
    }

    pub fn unsatisfied() -> Self {
        Self::new(Reachability::Unsatisfied)
    }

    pub fn status(&self) -> Reachability {
        self.status
    }
}

impl ConnectivityMonitor for FixedMonitor {
    fn name(&self) -> &str {
        match self.status {
            Reachability::Satisfied => "fixed-satisfied",
            Reachability::Unsatisfied => "fixed-unsatisfied",
        }
    }

    fn subscribe(&self, sink: EventSink) -> Result<Subscription, MonitorError> {
        let ticket = self.slot.attach(sink)?;
        self.slot.emit_for(ticket, MonitorSignal::from(self.status));
        let slot = Arc::clone(&self.slot);
        Ok(Subscription::new(move || slot.detach(ticket)))
    }
}
