//! Implementations for the localisation module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::{LocError, Params};
use crate::traj_gen::{Point, Velocity};
use util::{
    archive::{Archived, Archiver},
    maths::clamp,
    module::State,
    params,
    session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Millimeters per meter, the beacon offsets are configured in millimeters.
const MM_PER_M: f64 = 1000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Localisation module state
#[derive(Default)]
pub struct Loc {
    params: Params,

    /// Current pose estimate in the world frame.
    pose: Point,

    /// Current velocity estimate in the world frame.
    vel: Velocity,

    report: StatusReport,
    arch_report: Archiver,

    output: OutputData,
    arch_output: Archiver,
}

/// Input data to the module
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// Absolute position fix from the beacon pair, if one arrived this
    /// cycle. The pose is that of the beacon pair centre, not the robot
    /// centre.
    pub position_fix: Option<Point>,

    /// Velocity measured by wheel odometry, in the robot body frame.
    pub local_vel: Velocity,

    /// Time elapsed since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Output data from the module
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct OutputData {
    /// Pose estimate in the world frame.
    pub pose: Point,

    /// Velocity estimate in the world frame.
    pub vel: Velocity,
}

/// The status report containing monitoring quantities for this cycle.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Fraction of the position fix blended into the estimate this cycle,
    /// zero when no fix arrived.
    pub update_fraction: f64,
}

/// Flat record of the state estimate for the CSV archive, the csv
/// serialiser does not handle nested structs.
#[derive(Serialize)]
struct EstimateRecord {
    x_m: f64,
    y_m: f64,
    a_rad: f64,
    vx_ms: f64,
    vy_ms: f64,
    va_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Loc {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = LocError;

    /// Initialise the localisation module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session
    ) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;

        // Create the arch folder for loc
        let mut arch_path = session.arch_root.clone();
        arch_path.push("loc");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(
            session, "loc/status_report.csv"
        ).unwrap();
        self.arch_output = Archiver::from_path(
            session, "loc/estimate.csv"
        ).unwrap();

        Ok(())
    }

    /// Perform cyclic processing of localisation.
    fn proc(
        &mut self,
        input_data: &Self::InputData
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {

        if input_data.dt_s < 0.0 {
            return Err(LocError::NegativeCycleTime(input_data.dt_s));
        }

        self.report = StatusReport::default();

        self.update_velocity_reading(&input_data.local_vel, input_data.dt_s);

        if let Some(fix) = input_data.position_fix {
            self.report.update_fraction = self.update_position_reading(&fix);
        }

        // Keep the estimate for archiving
        self.output = OutputData {
            pose: self.pose,
            vel: self.vel
        };

        Ok((self.output, self.report))
    }
}

impl Archived for Loc {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(EstimateRecord::from(&self.output))?;

        Ok(())
    }
}

impl Loc {

    /// Propagate the pose estimate with a body-frame velocity measurement.
    ///
    /// The measurement is rotated into the world frame with the latest
    /// heading estimate before integration.
    fn update_velocity_reading(&mut self, local_vel: &Velocity, dt_s: f64) {
        let (sin_a, cos_a) = self.pose.a_rad.sin_cos();

        self.vel = Velocity {
            vx_ms: cos_a * local_vel.vx_ms - sin_a * local_vel.vy_ms,
            vy_ms: sin_a * local_vel.vx_ms + cos_a * local_vel.vy_ms,
            va_rads: local_vel.va_rads,
        };

        self.pose.x_m += self.vel.vx_ms * dt_s;
        self.pose.y_m += self.vel.vy_ms * dt_s;
        self.pose.a_rad += self.vel.va_rads * dt_s;
    }

    /// Blend an absolute position fix into the pose estimate, returning the
    /// fraction which was applied.
    ///
    /// The fix is measured at the centre of the beacon pair, so it is first
    /// transformed by the mounting offset into the robot's centre of
    /// rotation. The blend fraction falls linearly from the configured
    /// at-rest value down to zero at `vel_for_zero_update`.
    fn update_position_reading(&mut self, fix: &Point) -> f64 {
        let raw_measured_position =
            Vector3::new(fix.x_m, fix.y_m, fix.a_rad);
        let local_offset = Vector3::new(
            self.params.beacon_offset_x_mm / MM_PER_M,
            self.params.beacon_offset_y_mm / MM_PER_M,
            0.0
        );

        let (sin_a, cos_a) = fix.a_rad.sin_cos();
        let rotation = Matrix3::new(
            cos_a, -sin_a, 0.0,
            sin_a, cos_a, 0.0,
            0.0, 0.0, 1.0
        );

        let adjusted_measured_position =
            raw_measured_position - rotation * local_offset;

        // The beacons are less accurate when moving, so weight the fix down
        // with the current speed
        let total_vel = Vector3::new(
            self.vel.vx_ms, self.vel.vy_ms, self.vel.va_rads
        ).norm();

        let slope =
            self.params.update_fraction_at_zero_vel
            / -self.params.vel_for_zero_update;
        let update_fraction = clamp(
            &(self.params.update_fraction_at_zero_vel + slope * total_vel),
            &0.0,
            &self.params.update_fraction_at_zero_vel
        );

        self.pose.x_m +=
            update_fraction * (adjusted_measured_position[0] - self.pose.x_m);
        self.pose.y_m +=
            update_fraction * (adjusted_measured_position[1] - self.pose.y_m);
        self.pose.a_rad +=
            update_fraction * (adjusted_measured_position[2] - self.pose.a_rad);

        update_fraction
    }
}

impl From<&OutputData> for EstimateRecord {
    fn from(output: &OutputData) -> Self {
        Self {
            x_m: output.pose.x_m,
            y_m: output.pose.y_m,
            a_rad: output.pose.a_rad,
            vx_ms: output.vel.vx_ms,
            vy_ms: output.vel.vy_ms,
            va_rads: output.vel.va_rads,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn test_loc() -> Loc {
        Loc {
            params: Params {
                update_fraction_at_zero_vel: 0.2,
                vel_for_zero_update: 0.5,
                beacon_offset_x_mm: 0.0,
                beacon_offset_y_mm: 0.0,
            },
            ..Loc::default()
        }
    }

    #[test]
    fn test_velocity_update_rotates_into_world_frame() {
        let mut loc = test_loc();
        loc.pose.a_rad = FRAC_PI_2;

        // Driving straight ahead in the body frame while facing +Y moves
        // the robot along world +Y
        let (output, _) = loc
            .proc(&InputData {
                position_fix: None,
                local_vel: Velocity::new(1.0, 0.0, 0.0),
                dt_s: 0.1,
            })
            .unwrap();

        assert_abs_diff_eq!(output.vel.vx_ms, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(output.vel.vy_ms, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(output.pose.x_m, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(output.pose.y_m, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_position_fix_blend_at_rest() {
        let mut loc = test_loc();

        let (output, report) = loc
            .proc(&InputData {
                position_fix: Some(Point::new(1.0, 0.0, 0.0)),
                local_vel: Velocity::default(),
                dt_s: 0.1,
            })
            .unwrap();

        // At rest the full configured fraction applies
        assert_abs_diff_eq!(report.update_fraction, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(output.pose.x_m, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_position_fix_ignored_at_speed() {
        let mut loc = test_loc();

        // Moving at the zero-update speed the fix has no weight
        let (output, report) = loc
            .proc(&InputData {
                position_fix: Some(Point::new(1.0, 0.0, 0.0)),
                local_vel: Velocity::new(0.5, 0.0, 0.0),
                dt_s: 0.0,
            })
            .unwrap();

        assert_abs_diff_eq!(report.update_fraction, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(output.pose.x_m, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_beacon_offset_applied() {
        let mut loc = Loc {
            params: Params {
                update_fraction_at_zero_vel: 1.0,
                vel_for_zero_update: 0.5,
                beacon_offset_x_mm: 100.0,
                beacon_offset_y_mm: 0.0,
            },
            ..Loc::default()
        };

        // Fix at the beacon centre, robot facing +X: the robot centre is
        // 0.1 m behind the beacons, and a unit fraction adopts it outright
        let (output, _) = loc
            .proc(&InputData {
                position_fix: Some(Point::new(1.0, 0.0, 0.0)),
                local_vel: Velocity::default(),
                dt_s: 0.0,
            })
            .unwrap();

        assert_abs_diff_eq!(output.pose.x_m, 0.9, epsilon = 1e-9);
        assert_abs_diff_eq!(output.pose.y_m, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_cycle_time_rejected() {
        let mut loc = test_loc();

        let result = loc.proc(&InputData {
            position_fix: None,
            local_vel: Velocity::default(),
            dt_s: -0.1,
        });

        assert!(matches!(result, Err(LocError::NegativeCycleTime(_))));
    }
}
