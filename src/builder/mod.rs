//! Builder API for ergonomic machine construction.
//!
//! [`TrafficLightBuilder`] collects an environment and optional overrides of
//! the default timings and history limit, validates them together, and starts
//! the machine.

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::TrafficLightBuilder;
