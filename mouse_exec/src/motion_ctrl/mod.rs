//! # Motion control module
//!
//! Executes the two primitive maneuvers of the mouse, a forward move of a
//! given distance and a rotation in place by a given angle.
//!
//! A forward move runs three controllers at once. The centring controller
//! keeps the mouse in the middle of the corridor using the side distances,
//! the heading controller damps the rate at which those distances change,
//! and the distance controller brakes the mouse onto its target or onto a
//! wall ahead. A rotation runs an angle controller and a controller which
//! keeps the two wheels turning at the same rate.
//!
//! Each maneuver can be run to completion with `move_forward`/`rotate`, or
//! driven one iteration at a time through the `start_*`, `step_*` and
//! `finish_*` functions.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod forward;
mod params;
mod rotate;
mod state;

#[cfg(test)]
mod test_rig;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use forward::*;
pub use params::MotionCtrlParams;
pub use rotate::*;
pub use state::*;

use crate::pid::PidError;
use crate::sensor_fusion::FusionError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionCtrl operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("Invalid motion control parameters: {0}")]
    InvalidParams(String),

    #[error("PID controller error: {0}")]
    Pid(#[from] PidError),

    #[error("Sensor fusion error: {0}")]
    Fusion(#[from] FusionError),

    #[error("Maneuver cancelled")]
    Cancelled,

    #[error("Maneuver timed out after {iterations} iterations ({elapsed_s:.3} s)")]
    Timeout {
        iterations: u64,
        elapsed_s: f64
    },
}
