//! Rotate in place maneuver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use super::{Guard, MnvrKind, MnvrReport, MnvrStatus, MotionCtrl, MotionCtrlError};
use crate::clock::{Clock, Timer};
use crate::hal::{CancelSignal, Drive, RangeSensor};
use crate::pid::PidController;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of a rotation in progress.
#[derive(Debug, Clone)]
pub struct RotateMnvr {
    /// Requested angle, positive clockwise
    target_deg: f64,

    /// Signed angle still to turn
    remaining_deg: f64,

    /// Latest output of the angle controller
    angle_correction: f64,

    /// Latest output of the synchronisation controller, zero while it is
    /// suppressed
    sync_correction: f64,

    angle_pid: PidController,
    sync_pid: PidController,

    /// Time between wheel travel polls
    cycle_timer: Timer,

    guard: Guard,

    done: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RotateMnvr {
    /// Signed angle still to turn.
    ///
    /// Units: degrees
    pub fn remaining_deg(&self) -> f64 {
        self.remaining_deg
    }

    pub fn angle_correction(&self) -> f64 {
        self.angle_correction
    }

    pub fn sync_correction(&self) -> f64 {
        self.sync_correction
    }

    pub fn iterations(&self) -> u64 {
        self.guard.iterations
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<D, S, C, K> MotionCtrl<D, S, C, K>
where
    D: Drive,
    S: RangeSensor,
    C: Clock,
    K: CancelSignal
{
    /// Rotate in place by the given angle, positive clockwise, returning
    /// once the rotation is complete.
    pub fn rotate(&mut self, angle_deg: f64) -> Result<MnvrReport, MotionCtrlError> {
        let mut mnvr = self.start_rotate(angle_deg)?;

        while self.step_rotate(&mut mnvr)? == MnvrStatus::Running {}

        Ok(self.finish_rotate(mnvr))
    }

    /// Begin a rotation.
    pub fn start_rotate(&mut self, angle_deg: f64) -> Result<RotateMnvr, MotionCtrlError> {
        let mut angle_pid = PidController::from_gains(&self.params.angle_gains);
        let mut sync_pid = PidController::from_gains(&self.params.sync_gains);

        angle_pid.start(angle_deg, &self.hw.clock);
        sync_pid.start(0.0, &self.hw.clock);

        let angle_correction = angle_pid.correct(angle_deg, &self.hw.clock)?;

        // Travel before the rotation doesn't count towards it
        self.poll_counts();

        let mut cycle_timer = Timer::new();
        cycle_timer.start(&self.hw.clock);

        info!("Rotating {:.1} deg", angle_deg);

        Ok(RotateMnvr {
            target_deg: angle_deg,
            remaining_deg: angle_deg,
            angle_correction,
            sync_correction: 0.0,
            angle_pid,
            sync_pid,
            cycle_timer,
            guard: self.guard_start(),
            done: false,
        })
    }

    /// Run one iteration of a rotation.
    ///
    /// On error the drives are braked and the maneuver must be abandoned.
    pub fn step_rotate(&mut self, mnvr: &mut RotateMnvr) -> Result<MnvrStatus, MotionCtrlError> {
        if mnvr.done {
            return Ok(MnvrStatus::Complete)
        }

        if mnvr.remaining_deg.abs() <= self.params.angle_tolerance_deg
            && mnvr.angle_correction.abs() <= self.params.angle_demand_threshold
        {
            mnvr.done = true;
            return Ok(MnvrStatus::Complete)
        }

        match self.rotate_iteration(mnvr) {
            Ok(()) => Ok(MnvrStatus::Running),
            Err(e) => {
                self.brake();
                Err(e)
            }
        }
    }

    /// Complete a rotation, braking and settling.
    pub fn finish_rotate(&mut self, mnvr: RotateMnvr) -> MnvrReport {
        let elapsed_s = self.guard_elapsed_s(&mnvr.guard);

        self.brake();
        self.hw.clock.delay_ms(self.params.settle_ms);

        debug!(
            "Rotation finished after {} iterations, {:.2} deg left, angle integral {:.3}",
            mnvr.guard.iterations, mnvr.remaining_deg, mnvr.angle_pid.integral()
        );

        MnvrReport {
            kind: MnvrKind::Rotate,
            target: mnvr.target_deg,
            remaining: mnvr.remaining_deg,
            iterations: mnvr.guard.iterations,
            elapsed_s,
            stopped_at_wall: false,
        }
    }

    fn rotate_iteration(&mut self, mnvr: &mut RotateMnvr) -> Result<(), MotionCtrlError> {
        self.guard_check(&mut mnvr.guard)?;

        self.hw.clock.delay_ms(self.params.rot_cycle_delay_ms);

        let (left_counts, right_counts) = self.poll_counts();
        let dt = mnvr.cycle_timer.delta_s(&self.hw.clock);

        let cpm = self.params.counts_per_mm;
        let arc_mm = (left_counts - right_counts) as f64 / 2.0 / cpm;
        mnvr.remaining_deg -= (arc_mm / (self.params.wheel_separation_mm / 2.0)).to_degrees();

        let (left_mms, right_mms) = match dt > 0.0 {
            true => (left_counts as f64 / cpm / dt, right_counts as f64 / cpm / dt),
            false => (0.0, 0.0)
        };

        mnvr.angle_correction = mnvr.angle_pid.correct(mnvr.remaining_deg, &self.hw.clock)?;

        let mut left_speed = mnvr.angle_correction;
        let mut right_speed = -mnvr.angle_correction;

        // Positive sync error means the left wheel is outrunning the right
        let sync_error = left_mms.abs() - right_mms.abs();
        let mut sync = mnvr.sync_pid.correct(sync_error, &self.hw.clock)?;

        if left_speed.abs() < self.params.min_sync_speed
            || right_speed.abs() < self.params.min_sync_speed
        {
            sync = 0.0;
        }

        if sync > 0.0 {
            right_speed += sync * right_speed.signum();
        }
        else {
            left_speed -= sync * left_speed.signum();
        }

        mnvr.sync_correction = sync;

        self.command(left_speed, right_speed, self.params.rot_max_speed);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion_ctrl::test_rig::{self, approx};
    use crate::pid::PidGains;
    use crate::sim::{SimCancel, SimDrive};

    #[test]
    fn test_rotate_completes() {
        for &angle in &[90.0, -90.0, 180.0] {
            let mut ctrl = test_rig::kinematic_ctrl(test_rig::params(), test_rig::open_sensors());

            let report = ctrl.rotate(angle).unwrap();

            assert_eq!(report.kind, MnvrKind::Rotate);
            assert!(report.remaining.abs() <= 1.5);
            assert_eq!(ctrl.hw().left.brake_count(), 1);
            assert_eq!(ctrl.hw().right.brake_count(), 1);

            // Wheels turned in opposite directions, left forwards for clockwise
            let left = ctrl.hw().left.total_counts();
            let right = ctrl.hw().right.total_counts();
            assert_eq!(left.signum() as f64, angle.signum());
            assert_eq!(right.signum() as f64, -angle.signum());
        }
    }

    #[test]
    fn test_rotate_direction() {
        let mut ctrl = test_rig::kinematic_ctrl(test_rig::params(), test_rig::open_sensors());

        let mut mnvr = ctrl.start_rotate(90.0).unwrap();
        assert!(approx(mnvr.angle_correction(), 0.05 * 90.0));

        ctrl.step_rotate(&mut mnvr).unwrap();
        assert!(approx(ctrl.hw().left.speed(), 0.18));
        assert!(approx(ctrl.hw().right.speed(), -0.16));

        // (180 + 160)/2 counts at 100 counts/mm on a 36 mm turning radius
        ctrl.step_rotate(&mut mnvr).unwrap();
        let turned = (1.7f64 / 36.0).to_degrees();
        assert!(approx(mnvr.remaining_deg(), 90.0 - turned));
    }

    #[test]
    fn test_sync_suppressed_at_low_speed() {
        let mut params = test_rig::params();
        params.angle_gains = PidGains::new(0.002, 0.0, 0.0);
        params.sync_gains = PidGains::new(10.0, 0.0, 0.0);
        let mut ctrl = test_rig::kinematic_ctrl(params, test_rig::open_sensors());

        let mut mnvr = ctrl.start_rotate(90.0).unwrap();

        for _ in 0..5 {
            ctrl.step_rotate(&mut mnvr).unwrap();

            // Commands are below the sync threshold, so the wheels get exactly
            // the angle correction
            let corr = mnvr.angle_correction();
            assert!(corr.abs() < 0.25);
            assert_eq!(mnvr.sync_correction(), 0.0);
            assert!(approx(ctrl.hw().left.speed(), corr * 0.18));
            assert!(approx(ctrl.hw().right.speed(), -corr * 0.16));
        }
    }

    #[test]
    fn test_sync_zero_for_symmetric_travel() {
        let mut params = test_rig::params();
        params.rot_max_speed = [0.16, 0.16];
        params.sync_gains = PidGains::new(10.0, 1.0, 1.0);
        let mut ctrl = test_rig::kinematic_ctrl(params, test_rig::open_sensors());

        let mut mnvr = ctrl.start_rotate(90.0).unwrap();

        while ctrl.step_rotate(&mut mnvr).unwrap() == MnvrStatus::Running {
            assert_eq!(mnvr.sync_correction(), 0.0);
        }

        assert!(mnvr.is_done());
        assert!(mnvr.remaining_deg().abs() <= 1.5);
        assert_eq!(
            ctrl.hw().left.total_counts(),
            -ctrl.hw().right.total_counts()
        );
    }

    #[test]
    fn test_sync_speeds_up_lagging_wheel() {
        let mut params = test_rig::params();
        params.sync_gains = PidGains::new(0.001, 0.0, 0.0);
        let mut ctrl = test_rig::kinematic_ctrl(params, test_rig::open_sensors());

        let mut mnvr = ctrl.start_rotate(90.0).unwrap();

        // No travel yet, so no speed difference
        ctrl.step_rotate(&mut mnvr).unwrap();
        assert_eq!(mnvr.sync_correction(), 0.0);

        // Left wheel's max speed is higher, 900 mm/s against 800 mm/s
        ctrl.step_rotate(&mut mnvr).unwrap();
        assert!((mnvr.sync_correction() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_cancel() {
        let mut ctrl = test_rig::ctrl(
            test_rig::params(),
            SimDrive::kinematic(1000.0),
            SimDrive::kinematic(1000.0),
            test_rig::open_sensors(),
            SimCancel::after_polls(2)
        );

        assert_eq!(ctrl.rotate(90.0), Err(MotionCtrlError::Cancelled));
        assert_eq!(ctrl.hw().left.brake_count(), 1);
        assert_eq!(ctrl.hw().left.speed(), 0.0);
    }
}
