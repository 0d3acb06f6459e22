//! Builder for starting traffic lights.

use crate::builder::error::BuildError;
use crate::config::{MachineConfig, TimingConfig};
use crate::environment::Environment;
use crate::machine::TrafficLight;

/// Builder for starting a [`TrafficLight`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use stoplight::clock::SimulatedClock;
/// use stoplight::config::TimingConfig;
/// use stoplight::environment::Environment;
/// use stoplight::machine::TrafficLight;
/// use stoplight::monitor::FixedMonitor;
/// use std::sync::Arc;
///
/// let clock = Arc::new(SimulatedClock::new());
/// let env = Environment::new(clock.clone(), Arc::new(FixedMonitor::satisfied()));
///
/// let light = TrafficLight::builder()
///     .environment(env)
///     .timings(TimingConfig { green_delay_ms: 500, ..TimingConfig::default() })
///     .history_limit(16)
///     .start()
///     .unwrap();
///
/// clock.advance_ms(500);
/// assert_eq!(light.history().transitions().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TrafficLightBuilder {
    environment: Option<Environment>,
    config: MachineConfig,
}

impl TrafficLightBuilder {
    /// Create a new builder with default timings and history limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the environment (required).
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Replace the per-state delays.
    pub fn timings(mut self, timings: TimingConfig) -> Self {
        self.config.timings = timings;
        self
    }

    /// Set how many transitions the history keeps.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Replace the whole machine configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and start the machine.
    pub fn start(self) -> Result<TrafficLight, BuildError> {
        let environment = self.environment.ok_or(BuildError::MissingEnvironment)?;
        let config = self.config.validated()?;
        Ok(TrafficLight::start(&environment, config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use crate::config::{ConfigError, ConfigViolation};
    use crate::core::LightState;
    use crate::monitor::{ControllableMonitor, FixedMonitor};
    use std::sync::Arc;

    fn environment() -> (Arc<SimulatedClock>, Environment) {
        let clock = Arc::new(SimulatedClock::new());
        let env = Environment::new(clock.clone(), Arc::new(ControllableMonitor::new()));
        (clock, env)
    }

    #[test]
    fn builder_requires_environment() {
        let result = TrafficLightBuilder::new().start();

        assert!(matches!(result, Err(BuildError::MissingEnvironment)));
    }

    #[test]
    fn builder_reports_config_violations() {
        let (_clock, env) = environment();
        let result = TrafficLight::builder()
            .environment(env)
            .history_limit(0)
            .start();

        match result {
            Err(BuildError::Config(ConfigError::Invalid(violations))) => {
                assert_eq!(violations, vec![ConfigViolation::ZeroHistoryLimit]);
            }
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn fluent_api_applies_timings() {
        let (clock, env) = environment();
        let light = TrafficLight::builder()
            .environment(env)
            .timings(TimingConfig {
                green_delay_ms: 100,
                yellow_delay_ms: 200,
                red_delay_ms: 300,
            })
            .start()
            .unwrap();

        clock.advance_ms(100);
        assert_eq!(light.snapshot().light_state, LightState::Yellow);
        clock.advance_ms(200);
        assert_eq!(light.snapshot().light_state, LightState::Red);
        clock.advance_ms(300);
        assert_eq!(light.snapshot().light_state, LightState::Green);
    }

    #[test]
    fn config_replaces_earlier_overrides() {
        let (_clock, env) = environment();
        let light = TrafficLight::builder()
            .environment(env)
            .history_limit(3)
            .config(MachineConfig::default())
            .start()
            .unwrap();

        assert_eq!(light.history().limit(), MachineConfig::default().history_limit);
    }

    #[test]
    fn monitor_errors_surface_as_machine_errors() {
        let clock = Arc::new(SimulatedClock::new());
        let monitor = Arc::new(FixedMonitor::unsatisfied());
        let env = Environment::new(clock, monitor);
        let _first = TrafficLight::builder().environment(env.clone()).start().unwrap();

        let second = TrafficLight::builder().environment(env).start();
        assert!(matches!(second, Err(BuildError::Machine(_))));
    }
}
