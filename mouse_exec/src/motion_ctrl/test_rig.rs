//! Simulated motion controller used by the maneuver tests

use super::{MotionCtrl, MotionCtrlParams, MotionHw};
use crate::pid::PidGains;
use crate::sensor_fusion::{ChannelMap, FusionParams, SensorFusion};
use crate::sim::{SimCancel, SimClock, SimDrive, SimRangeSensor};

pub type SimCtrl = MotionCtrl<SimDrive, SimRangeSensor, SimClock, SimCancel>;

/// Distance read by channels with no wall in range.
pub const FAR_MM: f64 = 500.0;

/// Parameters giving well-behaved maneuvers on the simulated plant, where
/// wheels respond instantly and so derivative and integral terms only add
/// oscillation.
pub fn params() -> MotionCtrlParams {
    MotionCtrlParams {
        counts_per_mm: 100.0,
        centre_gains: PidGains::new(0.01, 0.0, 0.0),
        heading_gains: PidGains::new(0.01, 0.0, 0.0),
        distance_gains: PidGains::new(0.05, 0.0, 0.0),
        angle_gains: PidGains::new(0.05, 0.0, 0.0),
        sync_gains: PidGains::new(0.0, 0.0, 0.0),
        max_iterations: 10_000,
        max_duration_s: 100.0,
        ..MotionCtrlParams::default()
    }
}

/// Range sensors with no walls anywhere.
pub fn open_sensors() -> ChannelMap<SimRangeSensor> {
    ChannelMap::splat(SimRangeSensor::constant(FAR_MM))
}

pub fn ctrl(
    params: MotionCtrlParams,
    left: SimDrive,
    right: SimDrive,
    sensors: ChannelMap<SimRangeSensor>,
    cancel: SimCancel
) -> SimCtrl {
    let fusion = SensorFusion::new(FusionParams::default()).unwrap();
    let hw = MotionHw {
        left,
        right,
        sensors,
        clock: SimClock::new(),
        cancel,
    };

    MotionCtrl::new(params, fusion, hw).unwrap()
}

/// Controller whose wheels move 1000 counts per poll at full scale.
pub fn kinematic_ctrl(params: MotionCtrlParams, sensors: ChannelMap<SimRangeSensor>) -> SimCtrl {
    ctrl(
        params,
        SimDrive::kinematic(1000.0),
        SimDrive::kinematic(1000.0),
        sensors,
        SimCancel::default()
    )
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// A sensor reading each value for one whole refresh, the last repeating.
pub fn per_refresh(values: &[f64]) -> SimRangeSensor {
    let n = FusionParams::default().sample_size;

    SimRangeSensor::scripted(
        values.iter().flat_map(|v| std::iter::repeat(*v).take(n)).collect()
    )
}
