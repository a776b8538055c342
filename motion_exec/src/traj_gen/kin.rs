//! Kinematic primitives used throughout the motion software

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A planar pose of the robot.
///
/// Equality is bit-exact, which the solver relies on for degenerate move
/// detection and the tests rely on for terminal state checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    /// Position along the world X axis.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Position along the world Y axis.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Heading (angle to the world +X axis).
    ///
    /// Units: radians
    pub a_rad: f64,
}

/// A planar velocity of the robot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Velocity {
    /// Velocity along the world X axis.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Velocity along the world Y axis.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Angular rate about the robot's centre.
    ///
    /// Units: radians/second
    pub va_rads: f64,
}

/// A single point of a trajectory, containing all the info about a point in
/// time which the controller needs to drive the robot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PVTPoint {
    /// The demanded pose.
    pub position: Point,

    /// The demanded velocity.
    pub velocity: Velocity,

    /// Time from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// The maximum dynamic limits of one trajectory axis.
///
/// All three limits are strictly positive. Units are meters and seconds for
/// the translational axis and radians and seconds for the rotational axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct DynamicLimits {
    /// Maximum velocity magnitude.
    pub max_vel: f64,

    /// Maximum acceleration magnitude.
    pub max_acc: f64,

    /// Maximum jerk magnitude.
    pub max_jerk: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Point {
    pub fn new(x_m: f64, y_m: f64, a_rad: f64) -> Self {
        Self { x_m, y_m, a_rad }
    }
}

impl Velocity {
    pub fn new(vx_ms: f64, vy_ms: f64, va_rads: f64) -> Self {
        Self { vx_ms, vy_ms, va_rads }
    }

    /// True when the magnitude of every component is below `eps`.
    pub fn near_zero(&self, eps: f64) -> bool {
        self.vx_ms.abs() < eps
            && self.vy_ms.abs() < eps
            && self.va_rads.abs() < eps
    }
}

impl Mul<f64> for DynamicLimits {
    type Output = Self;

    /// Scale all three limits by a constant, used to build the reduced
    /// fine-mode limit profile.
    fn mul(self, rhs: f64) -> Self {
        Self {
            max_vel: self.max_vel * rhs,
            max_acc: self.max_acc * rhs,
            max_jerk: self.max_jerk * rhs,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[x: {:.3}, y: {:.3}, a: {:.3}]",
            self.x_m, self.y_m, self.a_rad
        )
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[vx: {:.3}, vy: {:.3}, va: {:.3}]",
            self.vx_ms, self.vy_ms, self.va_rads
        )
    }
}

impl fmt::Display for PVTPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[Position: {}, Velocity: {}, T: {:.3}]",
            self.position, self.velocity, self.time_s
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_near_zero() {
        assert!(Velocity::default().near_zero(1e-6));
        assert!(Velocity::new(1e-9, -1e-9, 1e-9).near_zero(1e-6));
        assert!(!Velocity::new(0.0, 0.0, 1e-3).near_zero(1e-6));
    }

    #[test]
    fn test_limit_scaling() {
        let limits = DynamicLimits {
            max_vel: 0.5,
            max_acc: 0.5,
            max_jerk: 1.0
        };

        let fine = limits * 0.5;
        assert_eq!(fine.max_vel, 0.25);
        assert_eq!(fine.max_acc, 0.25);
        assert_eq!(fine.max_jerk, 0.5);
    }
}
