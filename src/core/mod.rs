//! Core state machine types and logic.
//!
//! This module contains the pure core of the traffic light:
//! - State definitions via the `State` trait, plus `LightState` and `Direction`
//! - The declarative transition table
//! - Bounded, immutable history tracking
//!
//! Nothing in this module touches a clock, a thread, or a monitor.

mod history;
mod state;
mod table;

pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_LIMIT};
pub use state::{Direction, LightState, State};
pub use table::{TransitionRow, TransitionTable, GREEN_DELAY, RED_DELAY, YELLOW_DELAY};
