//! One dimensional seven-segment S-curve solver
//!
//! The solver turns a scalar displacement and a set of dynamic limits into
//! segment durations `(dt_j, dt_a, dt_v)` and the eight switch points which
//! fully describe the profile. The seven segments apply jerk in the sequence
//! `[+J, 0, -J, 0, -J, 0, +J]` over durations
//! `[dt_j, dt_a, dt_j, dt_v, dt_j, dt_a, dt_j]`, giving a symmetric
//! accelerate-cruise-decelerate profile which starts and ends at rest.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::eval::kinematics_in_region;
use super::{DynamicLimits, SolverParameters, TrajGenError, EPSILON};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of switch points describing an S-curve.
pub const NUM_SWITCH_POINTS: usize = 8;

/// Number of constant-jerk regions between the switch points.
pub const NUM_REGIONS: usize = NUM_SWITCH_POINTS - 1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fully defined point for switching from one region of the trajectory to
/// another. Storing these allows lookups without building a sampled table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SwitchPoint {
    /// Cumulative time of the switch.
    ///
    /// Units: seconds
    pub t_s: f64,

    /// Displacement at the switch. Unsigned, the direction sign is applied
    /// by the trajectory which owns the profile.
    pub pos: f64,

    /// Velocity at the switch.
    pub vel: f64,

    /// Acceleration at the switch.
    pub acc: f64,
}

/// Parameters defining a 1-D S-curve trajectory.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SCurveParameters {
    /// Velocity limit used to build the profile, possibly relaxed from the
    /// nominal limit.
    pub v_lim: f64,

    /// Acceleration limit used to build the profile, possibly relaxed from
    /// the nominal limit.
    pub a_lim: f64,

    /// Jerk limit used to build the profile. Never relaxed.
    pub j_lim: f64,

    /// State at each segment boundary, `switch_points[0]` is the origin.
    pub switch_points: [SwitchPoint; NUM_SWITCH_POINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SCurveParameters {
    /// Build a parameter set from nominal limits, with no switch points
    /// populated yet.
    pub fn from_limits(limits: &DynamicLimits) -> Self {
        Self {
            v_lim: limits.max_vel,
            a_lim: limits.max_acc,
            j_lim: limits.max_jerk,
            switch_points: [SwitchPoint::default(); NUM_SWITCH_POINTS],
        }
    }

    /// Total duration of the profile.
    ///
    /// Units: seconds
    pub fn duration(&self) -> f64 {
        self.switch_points[NUM_SWITCH_POINTS - 1].t_s
    }

    /// Total (unsigned) displacement covered by the profile.
    pub fn distance(&self) -> f64 {
        self.switch_points[NUM_SWITCH_POINTS - 1].pos
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve for an S-curve covering the given displacement under the given
/// dynamic limits.
///
/// The sign of `dist` is ignored, profiles always describe the displacement
/// magnitude and the caller applies the direction.
///
/// The nominal segment durations are
///
/// ```text
/// dt_j = A / J
/// dt_a = V / A - A / J
/// dt_v = D / V - V / A - A / J
/// ```
///
/// If either of the last two is negative the limits cannot all be reached
/// over this displacement, and the solver retries with relaxed velocity and
/// acceleration limits `V_k = V (1 - alpha k^e)`, `A_k = A (1 - beta k^e)`.
/// The jerk limit is never relaxed, it is the hardest physical limit of the
/// actuators.
pub fn solve_scurve(
    dist: f64,
    limits: &DynamicLimits,
    solver: &SolverParameters
) -> Result<SCurveParameters, TrajGenError> {

    let d = dist.abs();
    let mut params = SCurveParameters::from_limits(limits);

    // A degenerate displacement is a zero-duration profile
    if d < EPSILON {
        populate_switch_points(&mut params, 0.0, 0.0, 0.0);
        return Ok(params);
    }

    for k in 0..solver.num_loops {

        // Relax the velocity and acceleration limits for this loop. The
        // first loop runs with the full limits.
        let decay = (k as f64).powf(solver.exponent_decay);
        let v_lim = limits.max_vel * (1.0 - solver.alpha_decay * decay);
        let a_lim = limits.max_acc * (1.0 - solver.beta_decay * decay);

        // Once the decay consumes a whole limit no further loop can succeed
        if v_lim < EPSILON || a_lim < EPSILON {
            break;
        }

        let dt_j = a_lim / limits.max_jerk;
        let dt_a = v_lim / a_lim - dt_j;
        let dt_v = d / v_lim - v_lim / a_lim - dt_j;

        // Negative durations mean the trial limits are not simultaneously
        // reachable over this displacement
        if dt_a < -EPSILON || dt_v < -EPSILON {
            continue;
        }

        params.v_lim = v_lim;
        params.a_lim = a_lim;
        populate_switch_points(
            &mut params,
            dt_j,
            dt_a.max(0.0),
            dt_v.max(0.0)
        );

        if (params.distance() - d).abs() < EPSILON {
            return Ok(params);
        }
    }

    Err(TrajGenError::Infeasible {
        dist: d,
        loops: solver.num_loops
    })
}

/// Solve the inverse, constant-velocity problem: a rest-to-rest profile
/// which ramps up to `v_target`, holds it for the longest feasible plateau
/// within `move_time`, and ramps back down.
///
/// This solve cannot fail. If `v_target` exceeds the velocity limit, or the
/// ramps do not fit within `move_time`, the profile is silently clamped and
/// the requested velocity is met only best-effort.
pub fn solve_inverse(
    v_target: f64,
    move_time: f64,
    limits: &DynamicLimits
) -> SCurveParameters {

    let v = v_target.abs().min(limits.max_vel);
    let j_lim = limits.max_jerk;
    let mut params = SCurveParameters::from_limits(limits);

    // A rest demand is a zero-velocity cruise over the whole move
    if v < EPSILON {
        params.v_lim = 0.0;
        params.a_lim = 0.0;
        populate_switch_points(&mut params, 0.0, 0.0, move_time.max(0.0));
        return params;
    }

    // Ramp shape: hit the acceleration limit if the target velocity is high
    // enough, otherwise a pure-jerk ramp peaking below it
    let (dt_j, dt_a) = if v * j_lim >= limits.max_acc.powi(2) {
        let dt_j = limits.max_acc / j_lim;
        (dt_j, v / limits.max_acc - dt_j)
    }
    else {
        ((v / j_lim).sqrt(), 0.0)
    };

    // Plateau fills whatever time the two ramps leave over
    let dt_v = (move_time - 4.0 * dt_j - 2.0 * dt_a).max(0.0);

    params.v_lim = v;
    params.a_lim = j_lim * dt_j;
    populate_switch_points(&mut params, dt_j, dt_a, dt_v);

    params
}

/// Fill in all eight switch points from the segment durations by analytic
/// integration of the piecewise-constant jerk across each region.
///
/// The limits stored in `params` must be the ones the durations were solved
/// against.
pub fn populate_switch_points(
    params: &mut SCurveParameters,
    dt_j: f64,
    dt_a: f64,
    dt_v: f64
) {
    let durations = [dt_j, dt_a, dt_j, dt_v, dt_j, dt_a, dt_j];

    params.switch_points[0] = SwitchPoint::default();

    for (region, dt) in durations.iter().enumerate() {
        let [pos, vel, acc] = kinematics_in_region(params, region, *dt);

        params.switch_points[region + 1] = SwitchPoint {
            t_s: params.switch_points[region].t_s + dt,
            pos,
            vel,
            acc,
        };
    }
}

/// Rescale the limits of whichever profile completes first so that both
/// complete at the same instant.
///
/// Dilating a profile in time by `1/s` requires its velocity, acceleration
/// and jerk limits to scale by `s`, `s^2` and `s^3` respectively; that keeps
/// every segment-duration ratio fixed and the displacement unchanged, so a
/// single re-solve lands on the longer duration. A zero-displacement axis is
/// instead stretched in place as a zero-velocity cruise.
pub fn synchronize_parameters(
    params1: &mut SCurveParameters,
    params2: &mut SCurveParameters,
    solver: &SolverParameters
) -> Result<(), TrajGenError> {

    let t1 = params1.duration();
    let t2 = params2.duration();

    if (t1 - t2).abs() > EPSILON {

        // Pick out the axis which finishes first
        let (faster, t_long) = match t1 < t2 {
            true => (&mut *params1, t2),
            false => (&mut *params2, t1),
        };

        if faster.distance() < EPSILON {
            populate_switch_points(faster, 0.0, 0.0, t_long);
        }
        else {
            let scale = faster.duration() / t_long;
            let scaled_limits = DynamicLimits {
                max_vel: faster.v_lim * scale,
                max_acc: faster.a_lim * scale * scale,
                max_jerk: faster.j_lim * scale * scale * scale,
            };

            *faster = solve_scurve(faster.distance(), &scaled_limits, solver)?;
        }
    }

    // Confirm the durations actually landed together
    let t1 = params1.duration();
    let t2 = params2.duration();

    if (t1 - t2).abs() > EPSILON {
        return Err(TrajGenError::Desync {
            trans_t: t1,
            rot_t: t2
        });
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_gen::eval::REGION_JERK_SIGNS;
    use approx::assert_abs_diff_eq;

    fn test_solver() -> SolverParameters {
        SolverParameters {
            num_loops: 10,
            alpha_decay: 0.1,
            beta_decay: 0.1,
            exponent_decay: 2.0,
        }
    }

    fn test_limits() -> DynamicLimits {
        DynamicLimits {
            max_vel: 0.5,
            max_acc: 0.5,
            max_jerk: 1.0
        }
    }

    /// Assert the structural invariants which any accepted S-curve must meet
    fn assert_scurve_invariants(params: &SCurveParameters, dist: f64) {
        let sp = &params.switch_points;

        // Starts at the origin
        assert_eq!(sp[0], SwitchPoint::default());

        // Monotone switch times
        for i in 0..NUM_REGIONS {
            assert!(
                sp[i + 1].t_s >= sp[i].t_s,
                "switch times not monotone: t[{}] = {} > t[{}] = {}",
                i, sp[i].t_s, i + 1, sp[i + 1].t_s
            );
        }

        // Limit respect at every boundary
        for p in sp.iter() {
            assert!(p.vel.abs() <= params.v_lim + EPSILON);
            assert!(p.acc.abs() <= params.a_lim + EPSILON);
        }

        // Terminal rest and distance match
        assert_abs_diff_eq!(sp[7].vel, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(sp[7].acc, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(sp[7].pos, dist.abs(), epsilon = EPSILON);
    }

    #[test]
    fn test_solve_nominal() {
        // Limits reachable without relaxation: dt_j = 0.5, dt_a = 0.5,
        // dt_v = 0.5, total 3.5 s
        let params = solve_scurve(1.0, &test_limits(), &test_solver()).unwrap();

        assert_scurve_invariants(&params, 1.0);
        assert_abs_diff_eq!(params.duration(), 3.5, epsilon = EPSILON);
        assert_abs_diff_eq!(params.v_lim, 0.5, epsilon = EPSILON);

        // Cruise runs at the velocity limit
        assert_abs_diff_eq!(params.switch_points[3].vel, 0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(params.switch_points[4].vel, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_solve_relaxed() {
        // Too short to reach the full velocity limit, the solver must relax
        let params = solve_scurve(0.5, &test_limits(), &test_solver()).unwrap();

        assert_scurve_invariants(&params, 0.5);
        assert!(params.v_lim < test_limits().max_vel);
    }

    #[test]
    fn test_solve_negative_dist() {
        // Sign is the caller's concern, magnitudes must match
        let fwd = solve_scurve(0.75, &test_limits(), &test_solver()).unwrap();
        let bwd = solve_scurve(-0.75, &test_limits(), &test_solver()).unwrap();

        assert_abs_diff_eq!(fwd.distance(), bwd.distance(), epsilon = EPSILON);
        assert_abs_diff_eq!(fwd.duration(), bwd.duration(), epsilon = EPSILON);
    }

    #[test]
    fn test_solve_zero_dist() {
        let params = solve_scurve(0.0, &test_limits(), &test_solver()).unwrap();

        assert_abs_diff_eq!(params.duration(), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(params.distance(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_solve_infeasible() {
        // A tiny move under an extremely low jerk limit cannot be relaxed
        // into feasibility, dt_a stays negative until the decay runs out
        let limits = DynamicLimits {
            max_vel: 10.0,
            max_acc: 10.0,
            max_jerk: 0.01
        };

        let result = solve_scurve(0.001, &limits, &test_solver());

        assert!(matches!(result, Err(TrajGenError::Infeasible { .. })));
    }

    #[test]
    fn test_jerk_sign_sequence() {
        let params = solve_scurve(1.0, &test_limits(), &test_solver()).unwrap();
        let sp = &params.switch_points;

        for region in 0..NUM_REGIONS {
            let dt = sp[region + 1].t_s - sp[region].t_s;
            if dt < EPSILON {
                continue;
            }

            let jerk = (sp[region + 1].acc - sp[region].acc) / dt;
            let expected = REGION_JERK_SIGNS[region] * params.j_lim;
            assert_abs_diff_eq!(jerk, expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_inverse_nominal() {
        // 0.4 m/s under a 0.5 m/s limit, ramps fit easily in 10 s
        let params = solve_inverse(0.4, 10.0, &test_limits());

        // Peak velocity hits the target and the move fills the time
        assert_abs_diff_eq!(params.switch_points[3].vel, 0.4, epsilon = EPSILON);
        assert_abs_diff_eq!(params.duration(), 10.0, epsilon = EPSILON);

        // Rest to rest
        assert_abs_diff_eq!(params.switch_points[7].vel, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(params.switch_points[7].acc, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_inverse_clamps_velocity() {
        // Demand over the limit is clamped to the limit
        let params = solve_inverse(2.0, 10.0, &test_limits());

        assert_abs_diff_eq!(params.switch_points[3].vel, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_inverse_pure_jerk_ramp() {
        // Low target velocity never reaches the acceleration limit
        let params = solve_inverse(0.1, 10.0, &test_limits());

        assert!(params.a_lim < test_limits().max_acc);
        assert_abs_diff_eq!(params.switch_points[3].vel, 0.1, epsilon = EPSILON);
        assert_abs_diff_eq!(params.duration(), 10.0, epsilon = EPSILON);
    }

    #[test]
    fn test_inverse_zero_velocity() {
        // Rest demand holds station for the whole move
        let params = solve_inverse(0.0, 3.0, &test_limits());

        assert_abs_diff_eq!(params.duration(), 3.0, epsilon = EPSILON);
        assert_abs_diff_eq!(params.distance(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_synchronize_scales_faster_axis() {
        let solver = test_solver();

        let mut trans = solve_scurve(1.0, &test_limits(), &solver).unwrap();

        let rot_limits = DynamicLimits {
            max_vel: 1.0,
            max_acc: 1.0,
            max_jerk: 2.0
        };
        let mut rot = solve_scurve(0.5, &rot_limits, &solver).unwrap();

        let t_long = trans.duration().max(rot.duration());

        synchronize_parameters(&mut trans, &mut rot, &solver).unwrap();

        assert_abs_diff_eq!(
            trans.duration(),
            rot.duration(),
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(trans.duration(), t_long, epsilon = EPSILON);

        // Displacements survive the rescale
        assert_abs_diff_eq!(trans.distance(), 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(rot.distance(), 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_synchronize_zero_axis() {
        let solver = test_solver();

        let mut trans = solve_scurve(1.0, &test_limits(), &solver).unwrap();
        let mut rot = solve_scurve(0.0, &test_limits(), &solver).unwrap();

        synchronize_parameters(&mut trans, &mut rot, &solver).unwrap();

        assert_abs_diff_eq!(
            trans.duration(),
            rot.duration(),
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(rot.distance(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_synchronize_already_matched() {
        let solver = test_solver();

        let mut a = solve_scurve(1.0, &test_limits(), &solver).unwrap();
        let mut b = a.clone();

        synchronize_parameters(&mut a, &mut b, &solver).unwrap();

        assert_abs_diff_eq!(a.duration(), b.duration(), epsilon = EPSILON);
    }
}
