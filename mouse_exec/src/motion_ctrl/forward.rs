//! Forward move maneuver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::{Guard, MnvrKind, MnvrReport, MnvrStatus, MotionCtrl, MotionCtrlError};
use crate::clock::{Clock, Timer};
use crate::hal::{CancelSignal, Drive, RangeSensor};
use crate::pid::PidController;
use crate::sensor_fusion::{Channel, ChannelReading, RelativeDirection};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of a forward move in progress.
#[derive(Debug, Clone)]
pub struct ForwardMnvr {
    state: ForwardState,

    /// Requested distance
    target_mm: f64,

    /// Signed distance still to travel
    remaining_mm: f64,

    /// If true the mouse doesn't brake at the end of the move
    keep_going: bool,

    /// Set once a wall has been seen ahead
    wall_seen: bool,

    /// Set once the remaining distance has been replaced by the measured
    /// distance to the wall ahead
    committed_to_wall: bool,

    /// Whether the centring and heading controllers were fed last iteration
    side_tracking: bool,

    /// Latest centring correction, zero while there are no side walls
    centre_correction: f64,

    /// Latest heading correction, after ramping and attenuation
    heading_correction: f64,

    centre_pid: PidController,
    heading_pid: PidController,
    distance_pid: PidController,

    /// Time between iterations, for the heading ramp
    cycle_timer: Timer,

    guard: Guard,
}

/// States of the forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForwardState {
    /// Driving towards the target distance
    Approaching,

    /// A wall has been seen ahead and the mouse is braking onto it
    BrakingToWall,

    /// The move is complete
    Stopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ForwardMnvr {
    pub fn state(&self) -> ForwardState {
        self.state
    }

    /// Signed distance still to travel.
    ///
    /// Units: millimeters
    pub fn remaining_mm(&self) -> f64 {
        self.remaining_mm
    }

    pub fn keep_going(&self) -> bool {
        self.keep_going
    }

    pub fn iterations(&self) -> u64 {
        self.guard.iterations
    }

    pub fn centre_correction(&self) -> f64 {
        self.centre_correction
    }

    pub fn heading_correction(&self) -> f64 {
        self.heading_correction
    }
}

impl<D, S, C, K> MotionCtrl<D, S, C, K>
where
    D: Drive,
    S: RangeSensor,
    C: Clock,
    K: CancelSignal
{
    /// Move forward by the given distance, returning once the move is
    /// complete.
    ///
    /// If `keep_going` is true the mouse doesn't brake at the end of the
    /// move, so that the next move continues smoothly. Any distance left
    /// over (positive or negative) is carried into the next forward move.
    pub fn move_forward(
        &mut self,
        distance_mm: f64,
        keep_going: bool
    ) -> Result<MnvrReport, MotionCtrlError> {
        let mut mnvr = self.start_forward(distance_mm, keep_going)?;

        while self.step_forward(&mut mnvr)? == MnvrStatus::Running {}

        Ok(self.finish_forward(mnvr))
    }

    /// Begin a forward move.
    pub fn start_forward(
        &mut self,
        distance_mm: f64,
        keep_going: bool
    ) -> Result<ForwardMnvr, MotionCtrlError> {
        self.refresh_sensors();
        self.heading_ramp = 0.0;

        // Travel since the last move counts towards this one
        let (left, right) = self.poll_counts();
        let pre_travel_mm = (left + right) as f64 / (2.0 * self.params.counts_per_mm);

        let remaining_mm = distance_mm + self.leftover_mm - pre_travel_mm;
        self.leftover_mm = 0.0;

        let mut centre_pid = PidController::from_gains(&self.params.centre_gains);
        let mut heading_pid = PidController::from_gains(&self.params.heading_gains);
        let mut distance_pid = PidController::from_gains(&self.params.distance_gains);

        let centring = centring_error(
            self.fusion.reading(Channel::Left),
            self.fusion.reading(Channel::Right),
            self.params.corridor_width_mm
        );

        centre_pid.start(centring.map(|(e, _)| e).unwrap_or(0.0), &self.hw.clock);
        heading_pid.start(0.0, &self.hw.clock);
        distance_pid.start(self.params.braking_window_mm, &self.hw.clock);

        let mut cycle_timer = Timer::new();
        cycle_timer.start(&self.hw.clock);

        info!(
            "Forward move of {:.1} mm ({:.1} mm remaining, keep going: {})",
            distance_mm, remaining_mm, keep_going
        );

        Ok(ForwardMnvr {
            state: ForwardState::Approaching,
            target_mm: distance_mm,
            remaining_mm,
            keep_going,
            wall_seen: false,
            committed_to_wall: false,
            side_tracking: centring.is_some(),
            centre_correction: 0.0,
            heading_correction: 0.0,
            centre_pid,
            heading_pid,
            distance_pid,
            cycle_timer,
            guard: self.guard_start(),
        })
    }

    /// Run one iteration of a forward move.
    ///
    /// On error the drives are braked, the distance still to travel is
    /// carried into the next forward move and the maneuver is stopped.
    pub fn step_forward(&mut self, mnvr: &mut ForwardMnvr) -> Result<MnvrStatus, MotionCtrlError> {
        if mnvr.state == ForwardState::Stopped {
            return Ok(MnvrStatus::Complete)
        }

        match self.forward_iteration(mnvr) {
            Ok(s) => Ok(s),
            Err(e) => {
                self.brake();
                self.leftover_mm += mnvr.remaining_mm;
                mnvr.remaining_mm = 0.0;
                mnvr.state = ForwardState::Stopped;
                Err(e)
            }
        }
    }

    /// Complete a forward move, braking and settling unless the move is
    /// continuing.
    pub fn finish_forward(&mut self, mnvr: ForwardMnvr) -> MnvrReport {
        let elapsed_s = self.guard_elapsed_s(&mnvr.guard);

        if !mnvr.keep_going {
            self.brake();
            self.hw.clock.delay_ms(self.params.settle_ms);
            if mnvr.wall_seen {
                self.hw.clock.delay_ms(self.params.wall_settle_ms);
            }
        }

        self.leftover_mm += mnvr.remaining_mm;

        debug!(
            "Forward move finished after {} iterations, {:.2} mm left over",
            mnvr.guard.iterations, self.leftover_mm
        );

        MnvrReport {
            kind: MnvrKind::Forward,
            target: mnvr.target_mm,
            remaining: mnvr.remaining_mm,
            iterations: mnvr.guard.iterations,
            elapsed_s,
            stopped_at_wall: mnvr.committed_to_wall,
        }
    }

    fn forward_iteration(&mut self, mnvr: &mut ForwardMnvr) -> Result<MnvrStatus, MotionCtrlError> {
        self.guard_check(&mut mnvr.guard)?;

        let dt = mnvr.cycle_timer.delta_s(&self.hw.clock);

        self.refresh_sensors();

        let (left_counts, right_counts) = self.poll_counts();
        mnvr.remaining_mm -=
            (left_counts + right_counts) as f64 / (2.0 * self.params.counts_per_mm);

        // ---- CORRECTIONS ----

        let (centre, heading) = self.side_corrections(mnvr)?;
        mnvr.centre_correction = centre;
        mnvr.heading_correction = heading;

        let mut left_speed = 1.0;
        let mut right_speed = 1.0;

        if !mnvr.keep_going && mnvr.remaining_mm < self.params.braking_window_mm {
            let dist = mnvr.distance_pid.correct(mnvr.remaining_mm, &self.hw.clock)?;
            left_speed *= dist;
            right_speed *= dist;
        }

        if centre < 0.0 {
            left_speed *= 1.0 + centre;
        }
        else {
            right_speed *= 1.0 - centre;
        }

        if heading < 0.0 {
            left_speed *= 1.0 + heading;
        }
        else {
            right_speed *= 1.0 - heading;
        }

        self.command(left_speed, right_speed, self.params.fwd_max_speed);

        self.heading_ramp = match self.params.heading_warmup_s > 0.0 {
            true => (self.heading_ramp + dt / self.params.heading_warmup_s).min(1.0),
            false => 1.0
        };

        // ---- STATE TRANSITIONS ----

        let wall_ahead = self.fusion.is_wall_in_direction(RelativeDirection::Front)?;

        if wall_ahead && mnvr.state == ForwardState::Approaching {
            debug!("Wall ahead with {:.1} mm remaining, braking", mnvr.remaining_mm);
            mnvr.state = ForwardState::BrakingToWall;
            mnvr.wall_seen = true;
            mnvr.keep_going = false;
            mnvr.distance_pid.start(mnvr.remaining_mm, &self.hw.clock);
        }

        let tol = self.params.distance_tolerance_mm;
        let overrun = mnvr.keep_going && mnvr.remaining_mm <= -tol;

        if mnvr.remaining_mm.abs() < tol || overrun {
            if wall_ahead && !mnvr.committed_to_wall {
                mnvr.committed_to_wall = true;
                mnvr.remaining_mm = (
                    self.fusion.distance_mm(Channel::FrontLeft)
                    + self.fusion.distance_mm(Channel::FrontRight)
                ) / 2.0 - self.params.front_standoff_mm;

                debug!("Closing on the wall ahead, {:.1} mm to go", mnvr.remaining_mm);
            }
            else {
                mnvr.state = ForwardState::Stopped;
                return Ok(MnvrStatus::Complete)
            }
        }

        Ok(MnvrStatus::Running)
    }

    /// Centring and heading corrections, both halved, with the heading
    /// correction weakened while the centring correction is large.
    fn side_corrections(&mut self, mnvr: &mut ForwardMnvr) -> Result<(f64, f64), MotionCtrlError> {
        let centring = centring_error(
            self.fusion.reading(Channel::Left),
            self.fusion.reading(Channel::Right),
            self.params.corridor_width_mm
        );

        let (centre_error, drift) = match centring {
            Some(e) => e,
            None => {
                mnvr.side_tracking = false;
                return Ok((0.0, 0.0))
            }
        };

        let heading_error = self.heading_ramp * drift;

        if !mnvr.side_tracking {
            mnvr.centre_pid.start(centre_error, &self.hw.clock);
            mnvr.heading_pid.start(heading_error, &self.hw.clock);
            mnvr.side_tracking = true;
        }

        let centre = mnvr.centre_pid.correct(centre_error, &self.hw.clock)? / 2.0;
        let mut heading = mnvr.heading_pid.correct(heading_error, &self.hw.clock)? / 2.0;

        heading *= 1.0 - centre * centre;

        Ok((centre, heading))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Centring error and its drift rate from the side channels, or `None` if
/// neither side has a wall.
///
/// Positive errors mean the mouse is closer to the left wall than the
/// right.
pub fn centring_error(
    left: ChannelReading,
    right: ChannelReading,
    corridor_width_mm: f64
) -> Option<(f64, f64)> {
    match (left.wall, right.wall) {
        (true, true) => Some((
            right.distance_mm - left.distance_mm,
            right.rate_mms - left.rate_mms
        )),
        (true, false) => Some((
            corridor_width_mm - 2.0 * left.distance_mm,
            -2.0 * left.rate_mms
        )),
        (false, true) => Some((
            2.0 * right.distance_mm - corridor_width_mm,
            2.0 * right.rate_mms
        )),
        (false, false) => None
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
