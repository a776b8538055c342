//! # Localisation module
//!
//! Localisation maintains the robot's pose estimate by dead-reckoning the
//! wheel odometry velocity each cycle and blending in absolute position
//! fixes from the beacon pair when they arrive. The blend fraction shrinks
//! with speed since the beacon readings degrade while the robot is moving.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during localisation processing.
#[derive(Debug, Error)]
pub enum LocError {
    /// The cycle time handed to the propagation step was negative.
    #[error("Negative cycle time: {0} s")]
    NegativeCycleTime(f64),
}
