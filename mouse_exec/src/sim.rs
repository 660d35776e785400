//! # Simulated hardware
//!
//! Host-side implementations of the [`crate::hal`] and [`crate::clock`]
//! traits. The maneuvers, the benchmark and the `mnvr_test` executable run
//! against these instead of the encoder, motor and range drivers.
//!
//! The simulation is deliberately simple. Time only advances when something
//! delays or advances it, encoder counts are either scripted or proportional
//! to the commanded speed, and range sensors replay a fixed sequence.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cell::Cell;
use std::collections::VecDeque;

use crate::clock::Clock;
use crate::hal::{CancelSignal, Drive, RangeSensor};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A clock which only moves when told to.
///
/// `delay_ms` advances the clock instead of blocking.
#[derive(Debug, Default)]
pub struct SimClock {
    now_us: Cell<u64>,
}

/// One simulated wheel.
#[derive(Debug, Clone, Default)]
pub struct SimDrive {
    /// Counts returned by the next resets, in order
    scripted_counts: VecDeque<i64>,

    /// Counts accumulated between two resets while commanded at full scale
    counts_per_poll: f64,

    /// Last commanded speed, zero after a brake
    speed: f64,

    /// Number of times the brake was applied
    brake_count: usize,

    /// Sum of all counts returned so far
    total_counts: i64,
}

/// A range sensor replaying a list of samples, the last one repeating.
#[derive(Debug, Clone)]
pub struct SimRangeSensor {
    samples: VecDeque<f64>,
    last_mm: f64,
}

/// A cancel signal which fires after a number of polls, or when set.
#[derive(Debug, Default)]
pub struct SimCancel {
    polls: Cell<usize>,
    fire_after: Option<usize>,
    requested: Cell<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance_us(&self, micros: u64) {
        self.now_us.set(self.now_us.get() + micros);
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    fn delay_ms(&self, millis: u64) {
        self.advance_us(millis * 1000);
    }
}

impl SimDrive {
    /// A wheel which never moves.
    pub fn new() -> Self {
        Self::default()
    }

    /// A wheel whose travel is proportional to the commanded speed, giving
    /// `counts_per_poll` counts per reset at full scale.
    pub fn kinematic(counts_per_poll: f64) -> Self {
        Self {
            counts_per_poll,
            ..Self::default()
        }
    }

    /// A wheel which returns the given counts on successive resets, then
    /// behaves as a stationary wheel.
    pub fn scripted(counts: Vec<i64>) -> Self {
        Self {
            scripted_counts: counts.into(),
            ..Self::default()
        }
    }

    /// Append scripted counts, returned before any kinematic travel.
    pub fn with_script(mut self, counts: Vec<i64>) -> Self {
        self.scripted_counts.extend(counts);
        self
    }

    /// The last commanded speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn brake_count(&self) -> usize {
        self.brake_count
    }

    pub fn total_counts(&self) -> i64 {
        self.total_counts
    }
}

impl Drive for SimDrive {
    fn set_speed(&mut self, fraction: f64) {
        self.speed = fraction;
    }

    fn brake(&mut self) {
        self.speed = 0.0;
        self.brake_count += 1;
    }

    fn reset_travel_counter(&mut self) -> i64 {
        let counts = match self.scripted_counts.pop_front() {
            Some(c) => c,
            None => (self.speed * self.counts_per_poll).round() as i64
        };

        self.total_counts += counts;
        counts
    }
}

impl SimRangeSensor {
    /// A sensor which always reads the same distance.
    pub fn constant(distance_mm: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            last_mm: distance_mm,
        }
    }

    /// A sensor which replays `samples`, then keeps returning the last one.
    ///
    /// An empty list reads zero.
    pub fn scripted(samples: Vec<f64>) -> Self {
        Self {
            last_mm: samples.first().copied().unwrap_or(0.0),
            samples: samples.into(),
        }
    }
}

impl RangeSensor for SimRangeSensor {
    fn sample_distance_mm(&mut self) -> f64 {
        if let Some(d) = self.samples.pop_front() {
            self.last_mm = d;
        }

        self.last_mm
    }
}

impl SimCancel {
    /// A signal which is raised on the `polls`th poll and stays raised.
    pub fn after_polls(polls: usize) -> Self {
        Self {
            fire_after: Some(polls),
            ..Self::default()
        }
    }

    /// Raise the signal now.
    pub fn request(&self) {
        self.requested.set(true);
    }
}

impl CancelSignal for SimCancel {
    fn is_cancel_requested(&self) -> bool {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);

        if let Some(n) = self.fire_after {
            if polls >= n {
                self.requested.set(true);
            }
        }

        self.requested.get()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_drive() {
        let mut drive = SimDrive::kinematic(100.0).with_script(vec![0, 7]);
        drive.set_speed(0.5);

        assert_eq!(drive.reset_travel_counter(), 0);
        assert_eq!(drive.reset_travel_counter(), 7);
        assert_eq!(drive.reset_travel_counter(), 50);
        assert_eq!(drive.total_counts(), 57);

        drive.brake();
        assert_eq!(drive.reset_travel_counter(), 0);
        assert_eq!(drive.brake_count(), 1);
    }

    #[test]
    fn test_sim_range_sensor() {
        let mut sensor = SimRangeSensor::scripted(vec![10.0, 20.0]);
        assert_eq!(sensor.sample_distance_mm(), 10.0);
        assert_eq!(sensor.sample_distance_mm(), 20.0);
        assert_eq!(sensor.sample_distance_mm(), 20.0);
    }

    #[test]
    fn test_sim_cancel() {
        let cancel = SimCancel::after_polls(3);
        assert!(!cancel.is_cancel_requested());
        assert!(!cancel.is_cancel_requested());
        assert!(cancel.is_cancel_requested());
        assert!(cancel.is_cancel_requested());

        let cancel = SimCancel::default();
        assert!(!cancel.is_cancel_requested());
        cancel.request();
        assert!(cancel.is_cancel_requested());
    }
}
