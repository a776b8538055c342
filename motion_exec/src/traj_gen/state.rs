//! Implementations for the trajectory generation module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::{Vector2, Vector3};
use serde::Serialize;

// Internal
use super::{
    solve_inverse, solve_scurve, synchronize_parameters,
    DynamicLimits, PVTPoint, Params, Point, SCurveParameters,
    SolverParameters, TrajGenError, Velocity, EPSILON};
use util::{
    archive::{Archived, Archiver},
    maths::{ang_dist_pi, norm},
    module::State,
    params,
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory generation module state.
///
/// The module owns the current trajectory so that callers only ever need the
/// lookup, there is no need to pass trajectories around the executive.
#[derive(Default)]
pub struct TrajGen {
    params: Params,

    /// The current trajectory, `None` until the first successful generation.
    current_trajectory: Option<Trajectory>,

    report: StatusReport,
    arch_report: Archiver,

    /// Demand produced by the last processing cycle.
    output: Option<PVTPoint>,
    arch_output: Archiver,
}

/// Everything needed to define a synchronised point to point S-curve
/// trajectory in X, Y and heading.
#[derive(Clone, Copy, Debug)]
pub struct Trajectory {
    /// Unit vector along the straight line of travel, or zero for a pure
    /// rotation.
    pub trans_direction: Vector2<f64>,

    /// Sign of the rotation, `+1.0`, `-1.0`, or `0.0` for no rotation.
    pub rot_direction: f64,

    /// Pose at the start of the trajectory.
    pub initial_point: Point,

    /// Profile of the translation along the line of travel.
    pub trans_params: SCurveParameters,

    /// Profile of the rotation about the robot's centre.
    pub rot_params: SCurveParameters,
}

/// All the pieces needed to define the motion planning problem.
#[derive(Clone, Copy, Debug)]
pub struct MotionPlanningProblem {
    /// Initial pose as an `(x, y, a)` vector.
    pub initial_point: Vector3<f64>,

    /// Target pose as an `(x, y, a)` vector.
    pub target_point: Vector3<f64>,

    /// Limits applying to the translational axis.
    pub translational_limits: DynamicLimits,

    /// Limits applying to the rotational axis.
    pub rotational_limits: DynamicLimits,

    /// Feasibility search tuning.
    pub solver_params: SolverParameters,
}

/// Input data to the module
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// Time from the start of the current trajectory at which the demand is
    /// required.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// The status report containing monitoring quantities for this cycle.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True when a trajectory has been generated and is available for
    /// lookups.
    pub traj_loaded: bool,

    /// True when the lookup time is at or beyond the end of the current
    /// trajectory.
    pub traj_finished: bool,
}

/// Flat record of a PVT demand for the CSV archive, the csv serialiser does
/// not handle nested structs.
#[derive(Serialize)]
struct PvtRecord {
    time_s: f64,
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

impl State for TrajGen {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = PVTPoint;
    type StatusReport = StatusReport;
    type ProcError = TrajGenError;

    /// Initialise the trajectory generation module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session
    ) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;

        // Create the arch folder for traj_gen
        let mut arch_path = session.arch_root.clone();
        arch_path.push("traj_gen");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(
            session, "traj_gen/status_report.csv"
        ).unwrap();
        self.arch_output = Archiver::from_path(
            session, "traj_gen/output.csv"
        ).unwrap();

        Ok(())
    }

    /// Perform cyclic processing, looking up the demand at the input time.
    fn proc(
        &mut self,
        input_data: &Self::InputData
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {

        let pvt = self.lookup(input_data.time_s);

        self.report = StatusReport {
            traj_loaded: self.current_trajectory.is_some(),
            traj_finished: match self.current_trajectory {
                Some(ref t) => input_data.time_s >= t.duration() - EPSILON,
                None => false
            }
        };

        // Keep the demand for archiving
        self.output = Some(pvt);

        Ok((pvt, self.report))
    }
}

impl Archived for TrajGen {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        if let Some(ref pvt) = self.output {
            self.arch_output.serialise(PvtRecord::from(pvt))?;
        }

        Ok(())
    }
}

impl TrajGen {

    /// Generate a trajectory that starts at rest at the initial point and
    /// ends at rest at the target point.
    ///
    /// Setting `fine_mode` reduces the dynamic limits for a more accurate
    /// motion over short ranges. On failure the previously stored trajectory
    /// is left untouched.
    pub fn generate_point_to_point(
        &mut self,
        initial_point: Point,
        target_point: Point,
        fine_mode: bool
    ) -> Result<(), TrajGenError> {

        let problem = build_motion_planning_problem(
            &initial_point, &target_point, fine_mode, &self.params);

        debug!(
            "Point to point problem: {} -> {} (fine: {})",
            initial_point, target_point, fine_mode
        );

        let trajectory = generate_trajectory(&problem)?;

        info!(
            "Generated point to point trajectory, duration {:.3} s",
            trajectory.duration()
        );

        self.current_trajectory = Some(trajectory);

        Ok(())
    }

    /// Generate a trajectory that attempts to maintain the target velocity
    /// for the given move time.
    ///
    /// There is no guarantee on the accuracy of the velocity if the demand
    /// and move time would violate the dynamic limits of the selected mode,
    /// the profile is clamped to whatever the limits allow.
    pub fn generate_const_vel(
        &mut self,
        initial_point: Point,
        velocity: &Velocity,
        move_time_s: f64,
        fine_mode: bool
    ) -> Result<(), TrajGenError> {

        let (trans_limits, rot_limits) = limit_profiles(&self.params, fine_mode);

        // Split the demand into a translational speed along a fixed
        // direction and a signed angular rate
        let v_trans = norm(
            &[0f64; 2],
            &[velocity.vx_ms, velocity.vy_ms]
        ).unwrap();

        let trans_direction = match v_trans < EPSILON {
            true => Vector2::zeros(),
            false => Vector2::new(velocity.vx_ms, velocity.vy_ms) / v_trans,
        };

        let rot_direction = match velocity.va_rads.abs() < EPSILON {
            true => 0.0,
            false => velocity.va_rads.signum(),
        };

        let mut trans_params = solve_inverse(v_trans, move_time_s, &trans_limits);
        let mut rot_params =
            solve_inverse(velocity.va_rads, move_time_s, &rot_limits);

        synchronize_parameters(
            &mut trans_params, &mut rot_params, &self.params.solver)?;

        let trajectory = Trajectory {
            trans_direction,
            rot_direction,
            initial_point,
            trans_params,
            rot_params,
        };

        info!(
            "Generated constant velocity trajectory, demand {}, duration {:.3} s",
            velocity,
            trajectory.duration()
        );

        self.current_trajectory = Some(trajectory);

        Ok(())
    }

    /// Look up a point in the current trajectory based on the time, in
    /// seconds, from the start of the trajectory.
    ///
    /// Out of range times clamp to the start or terminal state. If no
    /// trajectory has been generated yet a zero demand at the origin is
    /// returned.
    pub fn lookup(&self, time_s: f64) -> PVTPoint {
        match self.current_trajectory {
            Some(ref trajectory) => trajectory.lookup(time_s),
            None => {
                warn!("Trajectory lookup before any generation, returning zero demand");
                PVTPoint {
                    time_s,
                    ..PVTPoint::default()
                }
            }
        }
    }
}

impl Trajectory {

    /// Total duration of the trajectory. Both axes share this duration
    /// after synchronisation.
    ///
    /// Units: seconds
    pub fn duration(&self) -> f64 {
        self.trans_params.duration().max(self.rot_params.duration())
    }

    /// Evaluate both axes at the given time and compose the planar demand.
    pub fn lookup(&self, time_s: f64) -> PVTPoint {
        let [trans_pos, trans_vel, _] =
            super::lookup_1d(time_s, &self.trans_params);
        let [rot_pos, rot_vel, _] =
            super::lookup_1d(time_s, &self.rot_params);

        let position = Point {
            x_m: self.initial_point.x_m + self.trans_direction[0] * trans_pos,
            y_m: self.initial_point.y_m + self.trans_direction[1] * trans_pos,
            a_rad: self.initial_point.a_rad + self.rot_direction * rot_pos,
        };

        let velocity = Velocity {
            vx_ms: self.trans_direction[0] * trans_vel,
            vy_ms: self.trans_direction[1] * trans_vel,
            va_rads: self.rot_direction * rot_vel,
        };

        PVTPoint {
            position,
            velocity,
            time_s,
        }
    }
}

impl From<&PVTPoint> for PvtRecord {
    fn from(pvt: &PVTPoint) -> Self {
        Self {
            time_s: pvt.time_s,
            x_m: pvt.position.x_m,
            y_m: pvt.position.y_m,
            a_rad: pvt.position.a_rad,
            vx_ms: pvt.velocity.vx_ms,
            vy_ms: pvt.velocity.vy_ms,
            va_rads: pvt.velocity.va_rads,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Assemble the motion planning problem for a point to point move, selecting
/// the limit profile for the requested mode.
pub fn build_motion_planning_problem(
    initial_point: &Point,
    target_point: &Point,
    fine_mode: bool,
    params: &Params
) -> MotionPlanningProblem {

    let (translational_limits, rotational_limits) =
        limit_profiles(params, fine_mode);

    MotionPlanningProblem {
        initial_point: Vector3::new(
            initial_point.x_m, initial_point.y_m, initial_point.a_rad),
        target_point: Vector3::new(
            target_point.x_m, target_point.y_m, target_point.a_rad),
        translational_limits,
        rotational_limits,
        solver_params: params.solver,
    }
}

/// Solve the full motion planning problem into a synchronised two axis
/// trajectory.
pub fn generate_trajectory(
    problem: &MotionPlanningProblem
) -> Result<Trajectory, TrajGenError> {

    // Straight line of travel between the poses.
    //
    // The unwrap here is safe since both slices have the same dimentions.
    let delta_x = problem.target_point[0] - problem.initial_point[0];
    let delta_y = problem.target_point[1] - problem.initial_point[1];
    let dist = norm(
        &[problem.initial_point[0], problem.initial_point[1]],
        &[problem.target_point[0], problem.target_point[1]]
    ).unwrap();

    let trans_direction = match dist < EPSILON {
        true => Vector2::zeros(),
        false => Vector2::new(delta_x, delta_y) / dist,
    };

    // Shortest signed rotation onto the target heading
    let delta_a = ang_dist_pi(problem.initial_point[2], problem.target_point[2]);

    let rot_direction = match delta_a.abs() < EPSILON {
        true => 0.0,
        false => delta_a.signum(),
    };

    let mut trans_params = solve_scurve(
        dist, &problem.translational_limits, &problem.solver_params)?;
    let mut rot_params = solve_scurve(
        delta_a.abs(), &problem.rotational_limits, &problem.solver_params)?;

    synchronize_parameters(
        &mut trans_params, &mut rot_params, &problem.solver_params)?;

    Ok(Trajectory {
        trans_direction,
        rot_direction,
        initial_point: Point::new(
            problem.initial_point[0],
            problem.initial_point[1],
            problem.initial_point[2]),
        trans_params,
        rot_params,
    })
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the limit profiles for the requested mode.
fn limit_profiles(
    params: &Params, fine_mode: bool
) -> (DynamicLimits, DynamicLimits) {
    match fine_mode {
        true => (
            params.trans_limits * params.fine_scale,
            params.rot_limits * params.fine_scale,
        ),
        false => (params.trans_limits, params.rot_limits),
    }
}
