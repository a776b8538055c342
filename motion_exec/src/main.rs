//! Motion executive entry point.
//!
//! # Architecture
//!
//! The executive demonstrates the motion planning subsystem end to end:
//!
//!     - Initialise the session, logger and modules
//!     - Generate a coarse point to point move followed by a fine constant
//!       velocity move
//!     - Main loop:
//!         - Trajectory lookup for the current cycle time
//!         - Localisation propagation using the demand as simulated odometry
//!         - Archive the PVT demand
//!
//! All modules (e.g. `traj_gen`) provide a public struct implementing the
//! `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use motion_lib::{
    loc::{self, Loc},
    traj_gen::{Point, TrajGen, Velocity},
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "motion_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .map_err(|e| eyre!("Failed to initialise logging: {:?}", e))?;

    info!("Motion Executive\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut traj_gen = TrajGen::default();
    traj_gen.init("params/traj_gen.toml", &session)
        .wrap_err("Failed to initialise TrajGen")?;
    info!("TrajGen init complete");

    let mut loc = Loc::default();
    loc.init("params/loc.toml", &session)
        .wrap_err("Failed to initialise Loc")?;
    info!("Loc init complete\n");

    // ---- DEMO MOVES ----

    // A coarse point to point move followed by a fine constant velocity
    // crawl, executed back to back
    let moves: Vec<DemoMove> = vec![
        DemoMove::PointToPoint {
            target: Point::new(1.0, 0.5, std::f64::consts::FRAC_PI_2),
            fine: false,
        },
        DemoMove::ConstVel {
            velocity: Velocity::new(0.05, 0.0, 0.0),
            move_time_s: 2.0,
            fine: true,
        },
    ];

    info!("Begining main loop\n");

    let mut pose_estimate = Point::default();

    for demo_move in moves {

        // ---- TRAJECTORY GENERATION ----

        match demo_move {
            DemoMove::PointToPoint { target, fine } => traj_gen
                .generate_point_to_point(pose_estimate, target, fine)
                .wrap_err("Point to point generation failed")?,
            DemoMove::ConstVel { velocity, move_time_s, fine } => traj_gen
                .generate_const_vel(pose_estimate, &velocity, move_time_s, fine)
                .wrap_err("Constant velocity generation failed")?,
        }

        // ---- EXECUTION LOOP ----

        let mut traj_time_s = 0.0;

        loop {
            let cycle_start_instant = Instant::now();

            // Trajectory lookup for this cycle
            let (pvt, report) = match traj_gen.proc(
                &motion_lib::traj_gen::InputData { time_s: traj_time_s }
            ) {
                Ok(or) => or,
                Err(e) => {
                    warn!("Error during TrajGen processing: {}", e);
                    break;
                }
            };

            // Feed the demand back through localisation as simulated
            // odometry. The demand velocity is in the world frame, rotate it
            // into the body frame before handing it to Loc.
            let (sin_a, cos_a) = pose_estimate.a_rad.sin_cos();
            let local_vel = Velocity::new(
                cos_a * pvt.velocity.vx_ms + sin_a * pvt.velocity.vy_ms,
                -sin_a * pvt.velocity.vx_ms + cos_a * pvt.velocity.vy_ms,
                pvt.velocity.va_rads,
            );

            match loc.proc(&loc::InputData {
                position_fix: None,
                local_vel,
                dt_s: CYCLE_PERIOD_S,
            }) {
                Ok((output, _)) => pose_estimate = output.pose,
                Err(e) => warn!("Error during Loc processing: {}", e)
            }

            // ---- WRITE ARCHIVES ----

            if let Err(e) = traj_gen.write() {
                warn!("Could not write the TrajGen archives: {}", e);
            }
            if let Err(e) = loc.write() {
                warn!("Could not write the Loc archives: {}", e);
            }

            if report.traj_finished {
                info!("Trajectory complete at t = {:.2} s", traj_time_s);
                info!("Pose estimate: {}\n", pose_estimate);
                break;
            }

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start_instant;

            match Duration::from_secs_f64(CYCLE_PERIOD_S)
                .checked_sub(cycle_dur)
            {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                )
            }

            traj_time_s += CYCLE_PERIOD_S;
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The moves executed by the demonstration loop.
enum DemoMove {
    PointToPoint {
        target: Point,
        fine: bool,
    },
    ConstVel {
        velocity: Velocity,
        move_time_s: f64,
        fine: bool,
    },
}
