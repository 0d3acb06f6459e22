//! State types for the traffic-light machine.
//!
//! The [`State`] trait describes any value that can occupy a machine's
//! current position. [`LightState`] is the one concrete implementation the
//! crate ships, and [`Direction`] is the cycle-order flag carried in the
//! machine's context.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Trait for state machine states.
///
/// All methods are pure - no side effects. States represent immutable
/// values that describe the current position in a state machine.
///
/// # Required Traits
///
/// - `Clone`: States must be cloneable for history tracking
/// - `PartialEq`: States must be comparable for transition logic
/// - `Debug`: States must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: States must be serializable for projections
///
/// # Example
///
/// ```rust
/// use stoplight::core::{LightState, State};
///
/// assert_eq!(LightState::Green.name(), "green");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// One of the three mutually exclusive display positions.
///
/// Serializes as the lowercase name (`"green"`, `"yellow"`, `"red"`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    Green,
    Yellow,
    Red,
}

impl LightState {
    /// Every light state, in forward cycle order.
    pub const ALL: [LightState; 3] = [Self::Green, Self::Yellow, Self::Red];

    /// Position of this state in [`LightState::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Green => 0,
            Self::Yellow => 1,
            Self::Red => 2,
        }
    }
}

impl State for LightState {
    fn name(&self) -> &str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cycle direction held in the machine's context.
///
/// `Forward` is green → yellow → red → green; `Reverse` is
/// green → red → yellow → green. Only connectivity events change it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// Map the boolean `reversed` flag onto a direction.
    pub const fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    /// The boolean `reversed` flag exposed in projections.
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::Reverse)
    }
}
