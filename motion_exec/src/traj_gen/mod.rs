//! # Trajectory generation module
//!
//! Trajectory generation is responsible for producing the smooth,
//! time-parameterised motion profiles which the controller follows. Given a
//! start pose and a target pose (or a constant velocity demand) it builds a
//! pair of one dimensional seven-segment S-curves, one for the translation
//! along the straight line between the poses and one for the rotation about
//! the robot's centre.
//!
//! An S-curve is a motion profile with piecewise-constant jerk, which gives
//! continuous acceleration. The profile is described entirely by its dynamic
//! limits and eight switch points, the cumulative `(t, p, v, a)` state at
//! each segment boundary. Holding only the switch points lets a lookup at an
//! arbitrary time be evaluated in closed form with at most seven comparisons
//! and no heap allocation, which keeps it safe to call from the control loop.
//!
//! The two axes are synchronised so that translation and rotation complete
//! at the same instant, by rescaling the dynamic limits of whichever axis
//! would finish first.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod eval;
mod kin;
mod params;
mod scurve;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
pub use eval::*;
pub use kin::*;
pub use params::*;
pub use scurve::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used for all floating point comparisons in trajectory units.
pub const EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during trajectory generation.
#[derive(Debug, Error)]
pub enum TrajGenError {
    /// The relaxation search ran out of loops without finding a feasible set
    /// of segment durations for the requested displacement.
    #[error(
        "No feasible S-curve found for displacement {dist:.6} after {loops} \
        relaxation loops")]
    Infeasible {
        dist: f64,
        loops: u32
    },

    /// The axis durations still differ after synchronisation.
    #[error(
        "Axis durations differ after synchronisation: translation {trans_t:.6} s, \
        rotation {rot_t:.6} s")]
    Desync {
        trans_t: f64,
        rot_t: f64
    },
}
