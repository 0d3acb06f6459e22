//! Build errors for the machine builder.

use crate::config::ConfigError;
use crate::machine::MachineError;
use thiserror::Error;

/// Errors that can occur when building and starting a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Environment not specified. Call .environment(env) before .start()")]
    MissingEnvironment,

    #[error("Invalid machine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Machine failed to start: {0}")]
    Machine(#[from] MachineError),
}
