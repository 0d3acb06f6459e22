//! Single-subscriber bookkeeping shared by every monitor backend.

use super::{EventSink, MonitorError, MonitorSignal};
use crate::sync::lock;
use std::sync::Mutex;

/// Holds the one active sink of a monitor instance.
///
/// Each attach gets a ticket; detaching with a stale ticket does nothing, so
/// a late release from an old subscription can never evict a newer one.
pub(crate) struct SubscriberSlot {
    monitor: String,
    state: Mutex<SlotState>,
}

struct SlotState {
    next_ticket: u64,
    active: Option<(u64, EventSink)>,
}

impl SubscriberSlot {
    pub(crate) fn new(monitor: impl Into<String>) -> Self {
        Self {
            monitor: monitor.into(),
            state: Mutex::new(SlotState {
                next_ticket: 0,
                active: None,
            }),
        }
    }

    pub(crate) fn attach(&self, sink: EventSink) -> Result<u64, MonitorError> {
        let mut state = lock(&self.state);
        if state.active.is_some() {
            return Err(MonitorError::AlreadySubscribed {
                monitor: self.monitor.clone(),
            });
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.active = Some((ticket, sink));
        Ok(ticket)
    }

    pub(crate) fn detach(&self, ticket: u64) {
        let mut state = lock(&self.state);
        if matches!(state.active, Some((active, _)) if active == ticket) {
            state.active = None;
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        lock(&self.state).active.is_some()
    }

    /// Deliver `signal` to the active sink, if any.
    ///
    /// The sink runs outside the slot lock so it may unsubscribe re-entrantly.
    pub(crate) fn emit(&self, signal: MonitorSignal) -> bool {
        let sink = lock(&self.state)
            .active
            .as_ref()
            .map(|(_, sink)| sink.clone());
        match sink {
            Some(sink) => {
                sink(signal);
                true
            }
            None => false,
        }
    }

    /// Deliver `signal` only if `ticket` is still the active subscription.
    pub(crate) fn emit_for(&self, ticket: u64, signal: MonitorSignal) -> bool {
        let sink = match &lock(&self.state).active {
            Some((active, sink)) if *active == ticket => Some(sink.clone()),
            _ => None,
        };
        match sink {
            Some(sink) => {
                sink(signal);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{ConnectivityEvent, MonitorSignal};
    use std::sync::Arc;

    fn collecting_sink() -> (Arc<Mutex<Vec<MonitorSignal>>>, EventSink) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: EventSink = Arc::new(move |signal: MonitorSignal| {
            sink_seen.lock().unwrap().push(signal)
        });
        (seen, sink)
    }

    #[test]
    fn second_attach_is_rejected() {
        let slot = SubscriberSlot::new("test");
        let (_, sink) = collecting_sink();
        slot.attach(sink.clone()).unwrap();

        let err = slot.attach(sink).unwrap_err();
        assert_eq!(
            err,
            MonitorError::AlreadySubscribed {
                monitor: "test".to_string()
            }
        );
    }

    #[test]
    fn detach_allows_resubscribe() {
        let slot = SubscriberSlot::new("test");
        let (_, sink) = collecting_sink();
        let ticket = slot.attach(sink.clone()).unwrap();
        slot.detach(ticket);

        assert!(!slot.is_attached());
        assert!(slot.attach(sink).is_ok());
    }

    #[test]
    fn stale_detach_keeps_newer_subscriber() {
        let slot = SubscriberSlot::new("test");
        let (_, sink) = collecting_sink();
        let old = slot.attach(sink.clone()).unwrap();
        slot.detach(old);
        let _new = slot.attach(sink).unwrap();

        slot.detach(old);
        assert!(slot.is_attached());
    }

    #[test]
    fn emit_reaches_only_active_sink() {
        let slot = SubscriberSlot::new("test");
        let (seen, sink) = collecting_sink();
        let signal = MonitorSignal::Event(ConnectivityEvent::Connected);

        assert!(!slot.emit(signal.clone()));
        let ticket = slot.attach(sink).unwrap();
        assert!(slot.emit(signal.clone()));
        assert!(!slot.emit_for(ticket + 1, signal.clone()));

        assert_eq!(*seen.lock().unwrap(), vec![signal]);
    }
}
