//! Configuration for machines and live monitors.
//!
//! Every section implements `Default` and is `#[serde(default)]`, so a JSON
//! document only needs the fields it overrides:
//!
//! ```rust
//! use stoplight::config::Config;
//!
//! let config = Config::from_json(r#"{ "machine": { "timings": { "red_delay_ms": 5000 } } }"#).unwrap();
//! assert_eq!(config.machine.timings.red_delay_ms, 5000);
//! assert_eq!(config.machine.timings.green_delay_ms, 2000);
//! ```
//!
//! Loading validates the result and reports every violation at once.

mod error;
mod validation;

pub use error::{ConfigError, ConfigViolation};
pub(crate) use error::summarize;

use crate::core::{LightState, TransitionTable, DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Per-state dwell times, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub green_delay_ms: u64,
    pub yellow_delay_ms: u64,
    pub red_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            green_delay_ms: 2000,
            yellow_delay_ms: 2000,
            red_delay_ms: 3500,
        }
    }
}

impl TimingConfig {
    pub fn delay_ms(&self, state: LightState) -> u64 {
        match state {
            LightState::Green => self.green_delay_ms,
            LightState::Yellow => self.yellow_delay_ms,
            LightState::Red => self.red_delay_ms,
        }
    }

    pub fn delay(&self, state: LightState) -> Duration {
        Duration::from_millis(self.delay_ms(state))
    }

    /// Transition table using these delays.
    pub fn table(&self) -> TransitionTable {
        TransitionTable::new(LightState::ALL.map(|state| self.delay(state)))
    }
}

/// Settings fixed for the lifetime of one machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub timings: TimingConfig,
    /// Maximum number of transitions kept in the machine's history.
    pub history_limit: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            timings: TimingConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Settings for [`LiveMonitor`](crate::monitor::LiveMonitor) and its TCP probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveMonitorConfig {
    /// Addresses to try; any successful connect means "satisfied".
    pub targets: Vec<SocketAddr>,
    pub connect_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for LiveMonitorConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                SocketAddr::from(([1, 1, 1, 1], 53)),
                SocketAddr::from(([8, 8, 8, 8], 53)),
            ],
            connect_timeout_ms: 1500,
            poll_interval_ms: 2000,
        }
    }
}

impl LiveMonitorConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top-level configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub machine: MachineConfig,
    pub live_monitor: LiveMonitorConfig,
}

impl Config {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_timings() {
        let timings = TimingConfig::default();
        assert_eq!(timings.delay(LightState::Green), Duration::from_millis(2000));
        assert_eq!(timings.delay(LightState::Yellow), Duration::from_millis(2000));
        assert_eq!(timings.delay(LightState::Red), Duration::from_millis(3500));
        assert_eq!(timings.table(), TransitionTable::default());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let config = Config::from_json(
            r#"{
                "machine": { "timings": { "yellow_delay_ms": 1000 }, "history_limit": 8 },
                "live_monitor": { "targets": ["127.0.0.1:8080"], "poll_interval_ms": 500 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.machine.timings.yellow_delay_ms, 1000);
        assert_eq!(config.machine.timings.red_delay_ms, 3500);
        assert_eq!(config.machine.history_limit, 8);
        assert_eq!(
            config.live_monitor.targets,
            vec![SocketAddr::from(([127, 0, 0, 1], 8080))]
        );
        assert_eq!(config.live_monitor.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.live_monitor.connect_timeout_ms, 1500);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = Config::from_json("{ machine: }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::default();
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
