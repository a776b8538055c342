//! Closed-form evaluation of S-curve profiles
//!
//! Lookups never interpolate a table. The active region is found with at
//! most seven comparisons and the kinematic state is integrated analytically
//! from the region's switch point, so evaluation is constant-time and
//! allocation-free.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::scurve::{SCurveParameters, NUM_REGIONS, NUM_SWITCH_POINTS};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sign of the jerk in each of the seven regions of the profile.
pub const REGION_JERK_SIGNS: [f64; NUM_REGIONS] =
    [1.0, 0.0, -1.0, 0.0, -1.0, 0.0, 1.0];

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Evaluate a 1-D profile at the given time, returning `[pos, vel, acc]`.
///
/// Times before the start of the profile clamp to the initial state, times
/// at or beyond the end clamp to the terminal displacement at rest.
pub fn lookup_1d(time_s: f64, params: &SCurveParameters) -> [f64; 3] {

    let first = &params.switch_points[0];
    if time_s <= first.t_s {
        return [first.pos, first.vel, first.acc];
    }

    let last = &params.switch_points[NUM_SWITCH_POINTS - 1];
    if time_s >= last.t_s {
        return [last.pos, 0.0, 0.0];
    }

    // Linear scan for the active region, t[r] <= t < t[r + 1]
    let mut region = NUM_REGIONS - 1;
    for r in 0..NUM_REGIONS {
        if time_s < params.switch_points[r + 1].t_s {
            region = r;
            break;
        }
    }

    kinematics_in_region(
        params,
        region,
        time_s - params.switch_points[region].t_s
    )
}

/// Integrate the kinematic state a duration `dt` into the given region,
/// starting from the region's switch point.
///
/// This is the single integration step shared by lookups and by switch
/// point population.
pub fn kinematics_in_region(
    params: &SCurveParameters,
    region: usize,
    dt: f64
) -> [f64; 3] {

    let sp = &params.switch_points[region];
    let jerk = REGION_JERK_SIGNS[region] * params.j_lim;

    let acc = sp.acc + jerk * dt;
    let vel = sp.vel + sp.acc * dt + 0.5 * jerk * dt * dt;
    let pos = sp.pos
        + sp.vel * dt
        + 0.5 * sp.acc * dt * dt
        + jerk * dt * dt * dt / 6.0;

    [pos, vel, acc]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_gen::{
        solve_scurve, DynamicLimits, SolverParameters, EPSILON
    };
    use approx::assert_abs_diff_eq;

    fn test_params() -> SCurveParameters {
        let limits = DynamicLimits {
            max_vel: 0.5,
            max_acc: 0.5,
            max_jerk: 1.0
        };
        let solver = SolverParameters {
            num_loops: 10,
            alpha_decay: 0.1,
            beta_decay: 0.1,
            exponent_decay: 2.0,
        };

        solve_scurve(1.0, &limits, &solver).unwrap()
    }

    #[test]
    fn test_lookup_boundaries() {
        let params = test_params();

        // Start of profile: origin at rest
        let [p, v, a] = lookup_1d(0.0, &params);
        assert_abs_diff_eq!(p, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(v, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(a, 0.0, epsilon = EPSILON);

        // Negative times clamp to the start
        assert_eq!(lookup_1d(-1.0, &params), lookup_1d(0.0, &params));

        // End of profile: full displacement at rest
        let [p, v, a] = lookup_1d(params.duration(), &params);
        assert_abs_diff_eq!(p, 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(v, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(a, 0.0, epsilon = EPSILON);

        // Times beyond the end clamp to the terminal state
        let [p, v, _] = lookup_1d(params.duration() + 100.0, &params);
        assert_abs_diff_eq!(p, 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(v, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_lookup_matches_switch_points() {
        let params = test_params();

        // Evaluating exactly at each interior switch time reproduces the
        // stored switch state
        for sp in params.switch_points[1..7].iter() {
            let [p, v, a] = lookup_1d(sp.t_s, &params);
            assert_abs_diff_eq!(p, sp.pos, epsilon = EPSILON);
            assert_abs_diff_eq!(v, sp.vel, epsilon = EPSILON);
            assert_abs_diff_eq!(a, sp.acc, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_lookup_continuity() {
        let params = test_params();
        let duration = params.duration();

        // Position steps between close samples are bounded by the velocity
        // limit
        let delta = 1e-3;
        let mut t = 0.0;
        while t < duration {
            let [p0, _, _] = lookup_1d(t, &params);
            let [p1, _, _] = lookup_1d(t + delta, &params);

            assert!(
                (p1 - p0).abs() <= params.v_lim * delta + EPSILON,
                "position discontinuity at t = {}", t
            );

            t += delta;
        }
    }

    #[test]
    fn test_velocity_integral_roundtrip() {
        let params = test_params();
        let duration = params.duration();

        // Trapezoidal integration of the velocity recovers the total
        // displacement
        let steps = 10_000usize;
        let dt = duration / steps as f64;
        let mut integral = 0.0;

        for i in 0..steps {
            let [_, v0, _] = lookup_1d(i as f64 * dt, &params);
            let [_, v1, _] = lookup_1d((i + 1) as f64 * dt, &params);
            integral += 0.5 * (v0 + v1) * dt;
        }

        assert_abs_diff_eq!(integral, params.distance(), epsilon = 1e-5);
    }

    #[test]
    fn test_velocity_never_exceeds_limit() {
        let params = test_params();
        let duration = params.duration();

        let steps = 1_000usize;
        for i in 0..=steps {
            let t = duration * i as f64 / steps as f64;
            let [_, v, a] = lookup_1d(t, &params);

            assert!(v.abs() <= params.v_lim + EPSILON);
            assert!(a.abs() <= params.a_lim + EPSILON);
        }
    }
}
