//! State transition history tracking.
//!
//! Provides bounded, immutable tracking of timed transitions. Timestamps come
//! from the machine's clock, so under a simulated clock they are virtual.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of transitions kept when no explicit limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Record of a single timed transition.
///
/// # Example
///
/// ```rust
/// use stoplight::core::{LightState, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: LightState::Green,
///     to: LightState::Yellow,
///     timestamp: Utc::now(),
///     reversed: false,
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// Clock time at which the transition fired
    pub timestamp: DateTime<Utc>,
    /// Direction flag that selected `to`
    pub reversed: bool,
}

/// Ordered, bounded history of state transitions.
///
/// History is immutable - the `record` method returns a new history
/// with the transition added. Once `limit` records are held, recording
/// drops the oldest one.
///
/// # Example
///
/// ```rust
/// use stoplight::core::{LightState, StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new();
/// let history = history.record(StateTransition {
///     from: LightState::Green,
///     to: LightState::Yellow,
///     timestamp: Utc::now(),
///     reversed: false,
/// });
/// let history = history.record(StateTransition {
///     from: LightState::Yellow,
///     to: LightState::Red,
///     timestamp: Utc::now(),
///     reversed: false,
/// });
///
/// let path = history.get_path();
/// assert_eq!(path, vec![&LightState::Green, &LightState::Yellow, &LightState::Red]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
    limit: usize,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history holding at most [`DEFAULT_HISTORY_LIMIT`] records.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a new empty history holding at most `limit` records.
    ///
    /// A limit of zero is raised to one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// This is a pure function - it does not mutate the existing history
    /// but returns a new one with the transition added.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let skip = (self.transitions.len() + 1).saturating_sub(self.limit);
        let mut transitions: Vec<_> = self.transitions.iter().skip(skip).cloned().collect();
        transitions.push(transition);
        Self {
            transitions,
            limit: self.limit,
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns references to states in order: the `from` state of the oldest
    /// retained transition, then the `to` state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate total duration from first to last retained transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all retained transitions, oldest first.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.last()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
