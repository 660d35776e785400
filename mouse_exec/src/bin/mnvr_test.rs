//! # Maneuver test executable
//!
//! Runs a sequence of forward moves and rotations against the simulated
//! hardware, logging each maneuver and archiving its report to the session.
//! The walls seen beside the mouse after each forward move are recorded in
//! a pair of maze maps, archived at the end of the run.
//!
//! Usage: `mnvr_test [MOTION_PARAMS_FILE]`, the parameter file defaulting to
//! `motion_ctrl.toml` under `$MOUSE_SW_ROOT/params/`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use serde::Deserialize;
use std::env;

// Internal
use mouse_lib::{
    maze_map::MazeMap,
    motion_ctrl::{MotionCtrl, MotionCtrlParams, MotionHw},
    sensor_fusion::{ChannelMap, FusionParams, RelativeDirection, SensorFusion},
    sim::{SimCancel, SimClock, SimDrive, SimRangeSensor},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Description of the simulated run.
#[derive(Debug, Deserialize)]
struct MnvrTestParams {
    /// Counts each wheel travels per poll when commanded at full scale.
    counts_per_poll: f64,

    /// Constant reading of each range channel.
    ///
    /// Units: millimeters
    range_mm: ChannelMap<f64>,

    /// Forward moves to make, all but the last continuing into the next.
    ///
    /// Units: millimeters
    forward_mm: Vec<f64>,

    /// Rotations to make after the forward moves.
    ///
    /// Units: degrees
    rotate_deg: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("mnvr_test", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, Some(&session))
        .wrap_err("Failed to initialise logging")?;

    info!("Micromouse Maneuver Test\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    let motion_params_path = match args.get(1) {
        Some(p) => p.as_str(),
        None => "motion_ctrl.toml"
    };

    let motion_params: MotionCtrlParams = util::params::load(motion_params_path)
        .wrap_err("Could not load motion control params")?;
    let fusion_params: FusionParams = util::params::load("sensor_fusion.toml")
        .wrap_err("Could not load sensor fusion params")?;
    let test_params: MnvrTestParams = util::params::load("mnvr_test.toml")
        .wrap_err("Could not load maneuver test params")?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let hw = MotionHw {
        left: SimDrive::kinematic(test_params.counts_per_poll),
        right: SimDrive::kinematic(test_params.counts_per_poll),
        sensors: test_params.range_mm.map(|_, d| SimRangeSensor::constant(*d)),
        clock: SimClock::new(),
        cancel: SimCancel::default(),
    };

    let fusion = SensorFusion::new(fusion_params)
        .wrap_err("Failed to initialise sensor fusion")?;
    let mut motion_ctrl = MotionCtrl::new(motion_params, fusion, hw)
        .wrap_err("Failed to initialise motion control")?;

    let cells = test_params.forward_mm.len().max(1);
    let mut left_walls = MazeMap::new(cells, 1);
    let mut right_walls = MazeMap::new(cells, 1);

    // ---- RUN MANEUVERS ----

    let mut num_mnvrs = 0;

    for (i, distance_mm) in test_params.forward_mm.iter().enumerate() {
        let keep_going = i + 1 < test_params.forward_mm.len();

        match motion_ctrl.move_forward(*distance_mm, keep_going) {
            Ok(report) => {
                info!(
                    "Forward {:.1} mm: {} iterations, {:.2} mm left",
                    distance_mm, report.iterations, report.remaining
                );
                session.save(format!("mnvr_{:03}.json", num_mnvrs), report);
            },
            Err(e) => warn!("Forward move of {:.1} mm failed: {}", distance_mm, e)
        }
        num_mnvrs += 1;

        let fusion = motion_ctrl.fusion();
        left_walls.set_flag(fusion.is_wall_in_direction(RelativeDirection::Left)?, i, 0);
        right_walls.set_flag(fusion.is_wall_in_direction(RelativeDirection::Right)?, i, 0);
    }

    for angle_deg in test_params.rotate_deg.iter() {
        match motion_ctrl.rotate(*angle_deg) {
            Ok(report) => {
                info!(
                    "Rotate {:.1} deg: {} iterations, {:.2} deg left",
                    angle_deg, report.iterations, report.remaining
                );
                session.save(format!("mnvr_{:03}.json", num_mnvrs), report);
            },
            Err(e) => warn!("Rotation of {:.1} deg failed: {}", angle_deg, e)
        }
        num_mnvrs += 1;
    }

    // ---- SHUTDOWN ----

    info!("Left walls:\n{}", left_walls);
    info!("Right walls:\n{}", right_walls);
    session.save("left_walls.json", left_walls);
    session.save("right_walls.json", right_walls);

    info!("{} maneuvers run, {:.2} mm left over", num_mnvrs, motion_ctrl.leftover_mm());

    session.exit();

    Ok(())
}
