//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use super::{MotionCtrlError, MotionCtrlParams};
use crate::clock::Clock;
use crate::hal::{CancelSignal, Drive, RangeSensor};
use crate::sensor_fusion::{ChannelMap, SensorFusion};
use util::maths::saturate;
use util::time::micros_to_seconds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The hardware a [`MotionCtrl`] drives and reads.
#[derive(Debug)]
pub struct MotionHw<D, S, C, K> {
    pub left: D,
    pub right: D,
    pub sensors: ChannelMap<S>,
    pub clock: C,
    pub cancel: K,
}

/// Motion control module state.
///
/// Owns the hardware and the sensor fusion state, both of which persist
/// across maneuvers.
#[derive(Debug)]
pub struct MotionCtrl<D, S, C, K> {
    pub(super) params: MotionCtrlParams,

    pub(super) hw: MotionHw<D, S, C, K>,

    pub(super) fusion: SensorFusion,

    /// Distance still to travel from the previous forward move, added to
    /// the next one.
    ///
    /// Units: millimeters
    pub(super) leftover_mm: f64,

    /// Strength of the heading correction, ramping from 0 to 1 after the
    /// side walls change.
    pub(super) heading_ramp: f64,
}

/// Progress of a maneuver after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MnvrStatus {
    Running,
    Complete,
}

/// Kind of maneuver a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MnvrKind {
    Forward,
    Rotate,
}

/// Summary of a finished maneuver, archived by the executable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MnvrReport {
    pub kind: MnvrKind,

    /// Requested distance (mm) or angle (degrees)
    pub target: f64,

    /// Distance (mm) or angle (degrees) left when the maneuver completed
    pub remaining: f64,

    /// Number of control iterations run
    pub iterations: u64,

    /// Duration of the maneuver, excluding settling
    pub elapsed_s: f64,

    /// True if a forward move finished by stopping at a wall ahead
    pub stopped_at_wall: bool,
}

/// Iteration and duration limits shared by both maneuvers.
#[derive(Debug, Clone, Copy)]
pub(super) struct Guard {
    pub iterations: u64,
    pub start_us: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D, S, C, K> MotionCtrl<D, S, C, K>
where
    D: Drive,
    S: RangeSensor,
    C: Clock,
    K: CancelSignal
{
    /// Create a new motion controller from its parameters, the fusion state
    /// and the hardware.
    pub fn new(
        params: MotionCtrlParams,
        fusion: SensorFusion,
        hw: MotionHw<D, S, C, K>
    ) -> Result<Self, MotionCtrlError> {
        params.validate()?;

        Ok(Self {
            params,
            hw,
            fusion,
            leftover_mm: 0.0,
            heading_ramp: 0.0,
        })
    }

    pub fn params(&self) -> &MotionCtrlParams {
        &self.params
    }

    pub fn fusion(&self) -> &SensorFusion {
        &self.fusion
    }

    pub fn hw(&self) -> &MotionHw<D, S, C, K> {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut MotionHw<D, S, C, K> {
        &mut self.hw
    }

    /// Distance carried over into the next forward move.
    ///
    /// Units: millimeters
    pub fn leftover_mm(&self) -> f64 {
        self.leftover_mm
    }

    /// Refresh sensor fusion outside of a maneuver.
    pub fn refresh_sensors(&mut self) {
        let report = self.fusion.refresh(&mut self.hw.sensors, &self.hw.clock);
        if report.any_transition() {
            self.heading_ramp = 0.0;
        }
    }

    pub(super) fn brake(&mut self) {
        self.hw.left.brake();
        self.hw.right.brake();
    }

    /// Command both wheels, clamping the fractions to full scale before
    /// scaling by each wheel's maximum speed.
    pub(super) fn command(&mut self, left: f64, right: f64, max_speed: [f64; 2]) {
        self.hw.left.set_speed(saturate(left, 1.0) * max_speed[0]);
        self.hw.right.set_speed(saturate(right, 1.0) * max_speed[1]);
    }

    /// Read and reset both travel counters, returning `(left, right)` counts.
    pub(super) fn poll_counts(&mut self) -> (i64, i64) {
        (
            self.hw.left.reset_travel_counter(),
            self.hw.right.reset_travel_counter()
        )
    }

    pub(super) fn guard_start(&self) -> Guard {
        Guard {
            iterations: 0,
            start_us: self.hw.clock.now_us(),
        }
    }

    /// Count one more iteration, failing if the maneuver has been cancelled
    /// or has run for too long.
    pub(super) fn guard_check(&self, guard: &mut Guard) -> Result<(), MotionCtrlError> {
        if self.hw.cancel.is_cancel_requested() {
            warn!("Maneuver cancelled after {} iterations", guard.iterations);
            return Err(MotionCtrlError::Cancelled)
        }

        let elapsed_s = self.guard_elapsed_s(guard);

        if guard.iterations >= self.params.max_iterations
            || elapsed_s > self.params.max_duration_s
        {
            warn!(
                "Maneuver timed out after {} iterations ({:.3} s)",
                guard.iterations, elapsed_s
            );
            return Err(MotionCtrlError::Timeout {
                iterations: guard.iterations,
                elapsed_s
            })
        }

        guard.iterations += 1;

        Ok(())
    }

    pub(super) fn guard_elapsed_s(&self, guard: &Guard) -> f64 {
        micros_to_seconds(self.hw.clock.now_us().saturating_sub(guard.start_us))
    }
}
