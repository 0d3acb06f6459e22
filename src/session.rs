//! Consumer-facing session around one machine.
//!
//! A [`Session`] is what a view layer talks to. It reads the machine through
//! [`snapshot`](Session::snapshot) and writes through exactly two control
//! calls: [`request_simulated_toggle`](Session::request_simulated_toggle) and
//! [`request_real_connectivity`](Session::request_real_connectivity).

use crate::config::MachineConfig;
use crate::environment::Environment;
use crate::machine::{MachineError, Snapshot, TrafficLight};
use crate::monitor::{ConnectivityMonitor, FixedMonitor};
use log::{info, warn};
use std::sync::Arc;

/// Label for the toggle control when the machine is reversed.
pub const SIMULATE_CONNECTED_LABEL: &str = "Simulate Internet Connected";
/// Label for the toggle control when the machine runs forward.
pub const SIMULATE_DISCONNECTED_LABEL: &str = "Simulate Internet Disconnected";

/// One running machine plus the environment it was started in.
#[derive(Debug)]
pub struct Session {
    env: Environment,
    machine: TrafficLight,
    using_real: bool,
}

impl Session {
    /// Start a machine on the registry's current monitor.
    pub fn start(env: Environment, config: MachineConfig) -> Result<Self, MachineError> {
        let machine = TrafficLight::start(&env, config)?;
        Ok(Self {
            env,
            machine,
            using_real: true,
        })
    }

    /// Pin connectivity to the opposite of the current direction.
    ///
    /// Registers a fixed monitor reporting the opposite status and rebinds the
    /// machine to it, so `reversed` flips and the light stays where it is.
    /// On error nothing changes.
    pub fn request_simulated_toggle(&mut self) -> Result<(), MachineError> {
        let monitor = if self.machine.snapshot().reversed {
            FixedMonitor::satisfied()
        } else {
            FixedMonitor::unsatisfied()
        };
        info!(
            "session for traffic light {} simulating '{}'",
            self.machine.id(),
            monitor.name()
        );
        self.switch_to(Arc::new(monitor))?;
        self.using_real = false;
        Ok(())
    }

    /// Return to the live monitor. On error nothing changes.
    pub fn request_real_connectivity(&mut self) -> Result<(), MachineError> {
        info!(
            "session for traffic light {} returning to live connectivity",
            self.machine.id()
        );
        self.switch_to(Arc::clone(self.env.live_monitor()))?;
        self.using_real = true;
        Ok(())
    }

    /// Register `monitor` and rebind the machine to it. On failure the
    /// registry gets its previous monitor back and the machine keeps its
    /// current subscription.
    fn switch_to(&self, monitor: Arc<dyn ConnectivityMonitor>) -> Result<(), MachineError> {
        let previous = self.env.monitors().set(monitor);
        if let Err(err) = self.machine.rebind_monitor() {
            warn!(
                "session for traffic light {} restoring monitor '{}': {err}",
                self.machine.id(),
                previous.name()
            );
            self.env.monitors().set(previous);
            return Err(err);
        }
        Ok(())
    }

    pub fn is_using_real_connectivity(&self) -> bool {
        self.using_real
    }

    /// Label for the toggle control, describing what pressing it will simulate.
    pub fn toggle_label(&self) -> &'static str {
        if self.machine.snapshot().reversed {
            SIMULATE_CONNECTED_LABEL
        } else {
            SIMULATE_DISCONNECTED_LABEL
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    pub fn machine(&self) -> &TrafficLight {
        &self.machine
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn stop(&self) {
        self.machine.stop();
    }
}
