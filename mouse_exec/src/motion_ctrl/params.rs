//! Parameters structure for MotionCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::MotionCtrlError;
use crate::pid::PidGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for motion control.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionCtrlParams {

    // ---- GEOMETRY ----

    /// Encoder counts per millimeter of wheel travel.
    pub counts_per_mm: f64,

    /// Distance between the two wheels' contact points.
    ///
    /// Units: millimeters
    pub wheel_separation_mm: f64,

    /// Sum of the left and right side distances when the mouse is centred
    /// in a corridor.
    ///
    /// Units: millimeters
    pub corridor_width_mm: f64,

    /// Front distance the mouse stops at when braking to a wall.
    ///
    /// Units: millimeters
    pub front_standoff_mm: f64,

    // ---- FORWARD MOVE ----

    /// Full-scale speed fractions of the left and right wheels during a
    /// forward move.
    pub fwd_max_speed: [f64; 2],

    /// Remaining distance below which the distance controller takes over
    /// the wheel speeds.
    ///
    /// Units: millimeters
    pub braking_window_mm: f64,

    /// Remaining distance within which a forward move is complete.
    ///
    /// Units: millimeters
    pub distance_tolerance_mm: f64,

    /// Time for the heading correction to ramp up to full strength after
    /// the side walls change.
    ///
    /// Units: seconds
    pub heading_warmup_s: f64,

    /// Gains of the corridor centring controller.
    pub centre_gains: PidGains,

    /// Gains of the heading controller, fed with the rate of change of the
    /// side distances.
    pub heading_gains: PidGains,

    /// Gains of the distance controller used while braking.
    pub distance_gains: PidGains,

    // ---- ROTATE IN PLACE ----

    /// Full-scale speed fractions of the left and right wheels during a
    /// rotation.
    pub rot_max_speed: [f64; 2],

    /// Delay at the start of each rotation cycle.
    ///
    /// Units: milliseconds
    pub rot_cycle_delay_ms: u64,

    /// Remaining angle within which a rotation may complete.
    ///
    /// Units: degrees
    pub angle_tolerance_deg: f64,

    /// Magnitude of angle correction below which a rotation may complete.
    pub angle_demand_threshold: f64,

    /// Wheel commands below this magnitude disable the wheel synchronisation
    /// correction.
    pub min_sync_speed: f64,

    /// Gains of the rotation angle controller.
    pub angle_gains: PidGains,

    /// Gains of the wheel synchronisation controller.
    pub sync_gains: PidGains,

    // ---- SETTLING ----

    /// Pause after braking.
    ///
    /// Units: milliseconds
    pub settle_ms: u64,

    /// Additional pause after braking in front of a wall.
    ///
    /// Units: milliseconds
    pub wall_settle_ms: u64,

    // ---- GUARDS ----

    /// Number of iterations after which a maneuver is abandoned.
    pub max_iterations: u64,

    /// Duration after which a maneuver is abandoned.
    ///
    /// Units: seconds
    pub max_duration_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionCtrlParams {

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), MotionCtrlError> {
        let positive = [
            ("counts_per_mm", self.counts_per_mm),
            ("wheel_separation_mm", self.wheel_separation_mm),
            ("distance_tolerance_mm", self.distance_tolerance_mm),
            ("angle_tolerance_deg", self.angle_tolerance_deg),
            ("max_duration_s", self.max_duration_s),
        ];

        for (name, value) in positive.iter() {
            if !(*value > 0.0) {
                return Err(MotionCtrlError::InvalidParams(format!(
                    "{} must be positive, found {}", name, value
                )))
            }
        }

        for speed in self.fwd_max_speed.iter().chain(self.rot_max_speed.iter()) {
            if !(*speed > 0.0 && *speed <= 1.0) {
                return Err(MotionCtrlError::InvalidParams(format!(
                    "Max speed fractions must be in (0, 1], found {}", speed
                )))
            }
        }

        if self.heading_warmup_s < 0.0 {
            return Err(MotionCtrlError::InvalidParams(format!(
                "heading_warmup_s must not be negative, found {}",
                self.heading_warmup_s
            )))
        }

        if self.max_iterations == 0 {
            return Err(MotionCtrlError::InvalidParams(
                "max_iterations must be at least 1".into()
            ))
        }

        Ok(())
    }
}

impl Default for MotionCtrlParams {
    fn default() -> Self {
        Self {
            counts_per_mm: 10.0,
            wheel_separation_mm: 72.0,
            corridor_width_mm: 84.0,
            front_standoff_mm: 30.0,

            fwd_max_speed: [0.21, 0.2],
            braking_window_mm: 180.0,
            distance_tolerance_mm: 2.0,
            heading_warmup_s: 0.5,
            centre_gains: PidGains::new(2.0, 0.0, 0.75).with_max_integral(25.0),
            heading_gains: PidGains::new(1.8, 0.0, 1.0).with_max_integral(1000.0),
            distance_gains: PidGains::new(20.0, 75.0, 4.0).with_max_integral(1000.0),

            rot_max_speed: [0.18, 0.16],
            rot_cycle_delay_ms: 2,
            angle_tolerance_deg: 1.5,
            angle_demand_threshold: 0.1,
            min_sync_speed: 0.25,
            angle_gains: PidGains::new(40.0, 120.0, 8.0).with_max_integral(1000.0),
            sync_gains: PidGains::new(30.0, 2.0, 1.0).with_max_integral(100.0),

            settle_ms: 250,
            wall_settle_ms: 500,

            max_iterations: 20_000,
            max_duration_s: 10.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file() {
        let params: MotionCtrlParams = util::params::parse(
            include_str!("../../../params/motion_ctrl.toml")
        ).unwrap();

        assert_eq!(params, MotionCtrlParams::default());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut params = MotionCtrlParams::default();
        params.counts_per_mm = 0.0;
        assert!(matches!(params.validate(), Err(MotionCtrlError::InvalidParams(_))));

        let mut params = MotionCtrlParams::default();
        params.rot_max_speed = [0.18, 1.5];
        assert!(params.validate().is_err());

        let mut params = MotionCtrlParams::default();
        params.max_iterations = 0;
        assert!(params.validate().is_err());
    }
}
