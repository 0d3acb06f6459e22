//! Dependency injection context for machines.
//!
//! An [`Environment`] bundles the clock a machine schedules on, the
//! [`MonitorRegistry`] it reads its connectivity source from, and the live
//! monitor a session can switch back to. It is cheap to clone; clones share
//! the same clock and registry slot.

use crate::clock::Clock;
use crate::monitor::ConnectivityMonitor;
use crate::sync::{read, write};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Slot holding the monitor the next machine start (or rebind) will use.
///
/// `get` and `set` are single atomic reads and replaces. Replacing the
/// monitor does not touch any machine already subscribed to the old one.
#[derive(Clone)]
pub struct MonitorRegistry {
    slot: Arc<RwLock<Arc<dyn ConnectivityMonitor>>>,
}

impl MonitorRegistry {
    pub fn new(monitor: Arc<dyn ConnectivityMonitor>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(monitor)),
        }
    }

    /// The currently registered monitor.
    pub fn get(&self) -> Arc<dyn ConnectivityMonitor> {
        Arc::clone(&read(&self.slot))
    }

    /// Register `monitor`, returning the one it replaced.
    pub fn set(&self, monitor: Arc<dyn ConnectivityMonitor>) -> Arc<dyn ConnectivityMonitor> {
        std::mem::replace(&mut *write(&self.slot), monitor)
    }
}

impl fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorRegistry")
            .field("current", &self.get().name())
            .finish()
    }
}

/// Everything a machine needs from the outside world.
#[derive(Clone)]
pub struct Environment {
    clock: Arc<dyn Clock>,
    monitors: MonitorRegistry,
    live: Arc<dyn ConnectivityMonitor>,
}

impl Environment {
    /// Environment whose registry starts out holding the live monitor.
    pub fn new(clock: Arc<dyn Clock>, live: Arc<dyn ConnectivityMonitor>) -> Self {
        let monitors = MonitorRegistry::new(Arc::clone(&live));
        Self {
            clock,
            monitors,
            live,
        }
    }

    /// Environment whose registry starts out holding `initial` instead of the live monitor.
    pub fn with_monitor(
        clock: Arc<dyn Clock>,
        live: Arc<dyn ConnectivityMonitor>,
        initial: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        Self {
            clock,
            monitors: MonitorRegistry::new(initial),
            live,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn monitors(&self) -> &MonitorRegistry {
        &self.monitors
    }

    /// The real connectivity source sessions return to.
    pub fn live_monitor(&self) -> &Arc<dyn ConnectivityMonitor> {
        &self.live
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("monitors", &self.monitors)
            .field("live", &self.live.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use crate::monitor::{ControllableMonitor, FixedMonitor};

    #[test]
    fn new_environment_registers_live_monitor() {
        let live: Arc<dyn ConnectivityMonitor> = Arc::new(ControllableMonitor::new());
        let env = Environment::new(Arc::new(SimulatedClock::new()), Arc::clone(&live));

        assert!(Arc::ptr_eq(&env.monitors().get(), &live));
        assert!(Arc::ptr_eq(env.live_monitor(), &live));
    }

    #[test]
    fn set_returns_previous_monitor() {
        let first: Arc<dyn ConnectivityMonitor> = Arc::new(FixedMonitor::satisfied());
        let second: Arc<dyn ConnectivityMonitor> = Arc::new(FixedMonitor::unsatisfied());
        let registry = MonitorRegistry::new(Arc::clone(&first));

        let previous = registry.set(Arc::clone(&second));

        assert!(Arc::ptr_eq(&previous, &first));
        assert_eq!(registry.get().name(), "fixed-unsatisfied");
    }

    #[test]
    fn clones_share_registry_slot() {
        let env = Environment::with_monitor(
            Arc::new(SimulatedClock::new()),
            Arc::new(ControllableMonitor::new()),
            Arc::new(FixedMonitor::satisfied()),
        );
        let clone = env.clone();

        clone.monitors().set(Arc::new(FixedMonitor::unsatisfied()));

        assert_eq!(env.monitors().get().name(), "fixed-unsatisfied");
        assert_eq!(env.live_monitor().name(), "controllable");
    }
}
