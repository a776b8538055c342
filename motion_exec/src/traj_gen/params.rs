//! Parameters structure for trajectory generation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::DynamicLimits;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory generation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {

    // ---- SOLVER ----

    /// Parameters controlling the S-curve feasibility search.
    pub solver: SolverParameters,

    // ---- DYNAMIC LIMITS ----

    /// Dynamic limits of the translational axis in coarse mode.
    ///
    /// Units: meters, seconds
    pub trans_limits: DynamicLimits,

    /// Dynamic limits of the rotational axis in coarse mode.
    ///
    /// Units: radians, seconds
    pub rot_limits: DynamicLimits,

    /// Fraction applied to both limit profiles in fine mode. Must be in
    /// `(0, 1)`; fine moves trade speed for accuracy over short ranges.
    pub fine_scale: f64,
}

/// Parameters controlling the limit-relaxation search of the S-curve solver.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct SolverParameters {
    /// Maximum number of relaxation loops before the solve is declared
    /// infeasible.
    pub num_loops: u32,

    /// Per-loop decay applied to the velocity limit.
    pub alpha_decay: f64,

    /// Per-loop decay applied to the acceleration limit.
    pub beta_decay: f64,

    /// Exponent applied to the loop index in the decay terms.
    pub exponent_decay: f64,
}
