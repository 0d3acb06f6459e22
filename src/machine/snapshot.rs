//! Read-only projection of a running machine.

use crate::core::{Direction, LightState};
use serde::{Deserialize, Serialize};

/// Current light state and direction flag, as exposed to consumers.
///
/// Serializes as `{ "lightState": "green", "reversed": false }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub light_state: LightState,
    pub reversed: bool,
}

impl Snapshot {
    pub const INITIAL: Snapshot = Snapshot {
        light_state: LightState::Green,
        reversed: false,
    };

    pub fn new(light_state: LightState, direction: Direction) -> Self {
        Self {
            light_state,
            reversed: direction.is_reversed(),
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_reversed(self.reversed)
    }
}
