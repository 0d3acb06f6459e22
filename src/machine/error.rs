//! Machine errors.

use crate::config::ConfigError;
use crate::monitor::MonitorError;
use thiserror::Error;

/// Errors starting or controlling a [`TrafficLight`](super::TrafficLight).
///
/// Once running, the machine itself has no failure modes: stale timers and
/// signals are ignored and monitor faults are counted, not raised.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Invalid machine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Monitor subscription failed: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Machine has been stopped")]
    Stopped,
}
