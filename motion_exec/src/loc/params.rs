//! Parameters structure for localisation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for localisation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {

    /// Fraction of a position fix blended into the pose estimate when the
    /// robot is at rest. Must be in `[0, 1]`.
    pub update_fraction_at_zero_vel: f64,

    /// Speed at which the blend fraction reaches zero and position fixes are
    /// ignored entirely.
    ///
    /// Units: meters/second
    pub vel_for_zero_update: f64,

    /// Offset from the centre of the beacon pair to the robot's centre of
    /// rotation, along the robot body X axis.
    ///
    /// Units: millimeters
    pub beacon_offset_x_mm: f64,

    /// Offset from the centre of the beacon pair to the robot's centre of
    /// rotation, along the robot body Y axis.
    ///
    /// Units: millimeters
    pub beacon_offset_y_mm: f64,
}
