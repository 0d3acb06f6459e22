//! Stoplight: a reactive traffic-light state machine
//!
//! Stoplight follows a "pure core, imperative shell" layout. The core is a
//! declarative transition table and immutable history; the shell is a
//! machine that applies timer completions and connectivity signals to that
//! core, one at a time, under a single lock.
//!
//! # Core Concepts
//!
//! - **LightState**: `green`, `yellow` or `red`; exactly one is active
//! - **Direction**: the `reversed` flag, set only by connectivity events
//! - **Clock**: injectable scheduling, simulated in tests and tokio-backed in production
//! - **Monitor**: a subscribable connectivity source held in a swappable registry
//! - **Snapshot**: the read-only `{ lightState, reversed }` projection
//!
//! # Example
//!
//! ```rust
//! use stoplight::clock::SimulatedClock;
//! use stoplight::config::MachineConfig;
//! use stoplight::core::LightState;
//! use stoplight::environment::Environment;
//! use stoplight::monitor::FixedMonitor;
//! use stoplight::session::Session;
//! use std::sync::Arc;
//!
//! let clock = Arc::new(SimulatedClock::new());
//! let env = Environment::new(clock.clone(), Arc::new(FixedMonitor::unsatisfied()));
//! let mut session = Session::start(env, MachineConfig::default()).unwrap();
//!
//! // The monitor reports "unsatisfied" on subscribe, so the cycle runs in reverse.
//! assert!(session.snapshot().reversed);
//! clock.advance_ms(2000);
//! assert_eq!(session.snapshot().light_state, LightState::Red);
//!
//! session.request_simulated_toggle().unwrap();
//! assert!(!session.snapshot().reversed);
//! assert_eq!(session.snapshot().light_state, LightState::Red);
//! ```

pub mod builder;
pub mod clock;
pub mod config;
pub mod core;
pub mod environment;
pub mod machine;
pub mod monitor;
pub mod session;

mod sync;

// Re-export commonly used types
pub use builder::{BuildError, TrafficLightBuilder};
pub use clock::{Clock, SimulatedClock, TokioClock};
pub use config::{Config, ConfigError, MachineConfig};
pub use self::core::{Direction, LightState, State, StateHistory, StateTransition};
pub use environment::{Environment, MonitorRegistry};
pub use machine::{MachineError, Snapshot, TrafficLight};
pub use monitor::{ConnectivityEvent, ConnectivityMonitor, Reachability};
pub use session::Session;
