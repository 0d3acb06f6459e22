//! Accumulating validation for configuration sections.
//!
//! Uses Stillwater's `Validation` so one pass reports every broken rule
//! instead of stopping at the first.

use super::{Config, ConfigError, ConfigViolation, LiveMonitorConfig, MachineConfig, TimingConfig};
use crate::core::LightState;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result of checking a configuration section.
pub type ConfigValidation = Validation<(), NonEmptyVec<ConfigViolation>>;

fn check(ok: bool, violation: ConfigViolation) -> ConfigValidation {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

fn violations(validation: ConfigValidation) -> Vec<ConfigViolation> {
    match validation {
        Validation::Success(()) => Vec::new(),
        Validation::Failure(violations) => violations.iter().cloned().collect(),
    }
}

fn into_result(validation: ConfigValidation) -> Result<(), ConfigError> {
    let violations = violations(validation);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(violations))
    }
}

impl TimingConfig {
    pub fn validate(&self) -> ConfigValidation {
        let checks: Vec<ConfigValidation> = LightState::ALL
            .iter()
            .map(|&state| check(self.delay_ms(state) > 0, ConfigViolation::ZeroDelay { state }))
            .collect();
        Validation::all_vec(checks).map(|_| ())
    }
}

impl MachineConfig {
    pub fn validate(&self) -> ConfigValidation {
        let checks = vec![
            self.timings.validate(),
            check(self.history_limit > 0, ConfigViolation::ZeroHistoryLimit),
        ];
        Validation::all_vec(checks).map(|_| ())
    }

    /// Validate, returning the config unchanged or every violation found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        into_result(self.validate()).map(|()| self)
    }
}

impl LiveMonitorConfig {
    pub fn validate(&self) -> ConfigValidation {
        let checks = vec![
            check(!self.targets.is_empty(), ConfigViolation::NoProbeTargets),
            check(self.connect_timeout_ms > 0, ConfigViolation::ZeroConnectTimeout),
            check(self.poll_interval_ms > 0, ConfigViolation::ZeroPollInterval),
        ];
        Validation::all_vec(checks).map(|_| ())
    }

    /// Every rule these settings break, empty when they are usable.
    pub fn violations(&self) -> Vec<ConfigViolation> {
        violations(self.validate())
    }
}

impl Config {
    pub fn validate(&self) -> ConfigValidation {
        Validation::all_vec(vec![self.machine.validate(), self.live_monitor.validate()])
            .map(|_| ())
    }

    /// Validate, returning the config unchanged or every violation found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        into_result(self.validate()).map(|()| self)
    }
}
