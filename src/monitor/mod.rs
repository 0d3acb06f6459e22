//! Connectivity monitors.
//!
//! A [`ConnectivityMonitor`] is a long-lived source of reachability signals.
//! Subscribing hands it an [`EventSink`]; the returned [`Subscription`]
//! releases the sink (and any tasks or OS resources behind it) when it is
//! unsubscribed or dropped.
//!
//! ```text
//!   FixedMonitor ───────┐
//!   ControllableMonitor ├──► subscribe(sink) ──► MonitorSignal ──► TrafficLight
//!   LiveMonitor<Probe> ─┘
//! ```
//!
//! Each monitor instance accepts a single active subscriber. A second
//! subscribe while the first is still active fails with
//! [`MonitorError::AlreadySubscribed`].

mod controllable;
mod fixed;
mod live;
mod slot;

pub use controllable::ControllableMonitor;
pub use fixed::FixedMonitor;
pub use live::{BoxProbeFuture, LiveMonitor, ProbeError, ReachabilityProbe, TcpProbe};

pub(crate) use slot::SubscriberSlot;

use crate::config::{summarize, ConfigViolation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Raw reachability status reported by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Satisfied,
    Unsatisfied,
}

/// Connectivity change consumed by the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityEvent {
    Connected,
    Disconnected,
}

impl From<Reachability> for ConnectivityEvent {
    fn from(status: Reachability) -> Self {
        match status {
            Reachability::Satisfied => Self::Connected,
            Reachability::Unsatisfied => Self::Disconnected,
        }
    }
}

/// Everything a monitor can deliver to its subscriber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorSignal {
    /// The connectivity status changed (or was reported for the first time).
    Event(ConnectivityEvent),
    /// The backend could not determine reachability. Non-fatal; carries no status.
    Fault(String),
}

impl From<Reachability> for MonitorSignal {
    fn from(status: Reachability) -> Self {
        Self::Event(status.into())
    }
}

/// Callback a monitor invokes for each signal. May be called from any thread.
pub type EventSink = Arc<dyn Fn(MonitorSignal) + Send + Sync>;

/// Errors at the monitor boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Monitor '{monitor}' already has an active subscriber")]
    AlreadySubscribed { monitor: String },

    #[error("Monitor '{monitor}' needs a running tokio runtime")]
    NoRuntime { monitor: String },

    #[error("Monitor '{monitor}' has invalid settings: {}", summarize(.violations))]
    InvalidSettings {
        monitor: String,
        violations: Vec<ConfigViolation>,
    },
}

/// A subscribable source of [`MonitorSignal`]s.
pub trait ConnectivityMonitor: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Start delivering signals to `sink`.
    fn subscribe(&self, sink: EventSink) -> Result<Subscription, MonitorError>;
}

/// Handle to an active subscription.
///
/// Releasing happens exactly once: either through [`unsubscribe`](Self::unsubscribe),
/// which consumes the handle, or on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Stop receiving signals and release the backend's resources.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn reachability_maps_to_events() {
        assert_eq!(
            ConnectivityEvent::from(Reachability::Satisfied),
            ConnectivityEvent::Connected
        );
        assert_eq!(
            MonitorSignal::from(Reachability::Unsatisfied),
            MonitorSignal::Event(ConnectivityEvent::Disconnected)
        );
    }

    #[test]
    fn reachability_uses_status_names() {
        let parsed: Reachability = serde_json::from_str("\"unsatisfied\"").unwrap();
        assert_eq!(parsed, Reachability::Unsatisfied);
    }

    #[test]
    fn subscription_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        {
            let _subscription = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
