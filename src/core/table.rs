//! Declarative transition table.
//!
//! Every timed move of the machine is a lookup in this table: the current
//! state selects a row, the direction selects the target column, and the row
//! carries how long the machine dwells in that state before moving on.
//!
//! | From   | Delay  | Forward | Reverse |
//! |--------|--------|---------|---------|
//! | green  | 2000ms | yellow  | red     |
//! | yellow | 2000ms | red     | green   |
//! | red    | 3500ms | green   | yellow  |

use super::state::{Direction, LightState};
use std::time::Duration;

/// Default dwell time in green.
pub const GREEN_DELAY: Duration = Duration::from_millis(2000);
/// Default dwell time in yellow.
pub const YELLOW_DELAY: Duration = Duration::from_millis(2000);
/// Default dwell time in red.
pub const RED_DELAY: Duration = Duration::from_millis(3500);

/// One row of the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionRow {
    pub from: LightState,
    pub delay: Duration,
    pub forward: LightState,
    pub reverse: LightState,
}

impl TransitionRow {
    /// Target of this row for the given direction.
    pub const fn target(&self, direction: Direction) -> LightState {
        match direction {
            Direction::Forward => self.forward,
            Direction::Reverse => self.reverse,
        }
    }
}

/// State × direction → next state, and state → delay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionTable {
    rows: [TransitionRow; 3],
}

impl TransitionTable {
    /// Build the table with per-state delays, indexed like [`LightState::ALL`].
    pub const fn new(delays: [Duration; 3]) -> Self {
        Self {
            rows: [
                TransitionRow {
                    from: LightState::Green,
                    delay: delays[0],
                    forward: LightState::Yellow,
                    reverse: LightState::Red,
                },
                TransitionRow {
                    from: LightState::Yellow,
                    delay: delays[1],
                    forward: LightState::Red,
                    reverse: LightState::Green,
                },
                TransitionRow {
                    from: LightState::Red,
                    delay: delays[2],
                    forward: LightState::Green,
                    reverse: LightState::Yellow,
                },
            ],
        }
    }

    pub fn row(&self, state: LightState) -> &TransitionRow {
        &self.rows[state.index()]
    }

    /// How long the machine stays in `state` before its timer fires.
    pub fn delay(&self, state: LightState) -> Duration {
        self.row(state).delay
    }

    /// Where the machine goes when the timer for `from` fires.
    pub fn target(&self, from: LightState, direction: Direction) -> LightState {
        self.row(from).target(direction)
    }

    pub fn rows(&self) -> &[TransitionRow] {
        &self.rows
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new([GREEN_DELAY, YELLOW_DELAY, RED_DELAY])
    }
}
