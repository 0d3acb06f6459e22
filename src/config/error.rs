//! Configuration error types.

use crate::core::LightState;
use thiserror::Error;

/// A single rule a configuration breaks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("Delay for {state} must be greater than zero")]
    ZeroDelay { state: LightState },

    #[error("History limit must be greater than zero")]
    ZeroHistoryLimit,

    #[error("Live monitor needs at least one probe target")]
    NoProbeTargets,

    #[error("Live monitor connect timeout must be greater than zero")]
    ZeroConnectTimeout,

    #[error("Live monitor poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the configuration schema
    #[error("Configuration parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but breaks one or more rules
    #[error("Invalid configuration: {}", summarize(.0))]
    Invalid(Vec<ConfigViolation>),
}

pub(crate) fn summarize(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_violation() {
        let err = ConfigError::Invalid(vec![
            ConfigViolation::ZeroDelay {
                state: LightState::Red,
            },
            ConfigViolation::ZeroHistoryLimit,
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Delay for red must be greater than zero; \
             History limit must be greater than zero"
        );
    }
}
