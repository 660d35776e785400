//! # Hardware abstraction
//!
//! Traits for the collaborators the navigation core drives and reads. The
//! encoder, PWM and analog drivers implementing these live outside the core.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// One wheel's motor and encoder.
pub trait Drive {
    /// Command the wheel speed as a fraction of full scale.
    ///
    /// Values are between -1 and +1, the sign giving the direction (positive
    /// drives the mouse forwards).
    fn set_speed(&mut self, fraction: f64);

    /// Actively brake the wheel.
    fn brake(&mut self);

    /// Return the encoder counts accumulated since the last reset and zero
    /// the counter.
    fn reset_travel_counter(&mut self) -> i64;
}

/// A single calibrated range sensor.
pub trait RangeSensor {
    /// Take one raw reading.
    ///
    /// Units: millimeters
    fn sample_distance_mm(&mut self) -> f64;
}

/// An external request to abandon the current maneuver.
pub trait CancelSignal {
    /// True if the running maneuver should stop. Polled once per iteration.
    fn is_cancel_requested(&self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A cancel signal which never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CancelSignal for NeverCancel {
    fn is_cancel_requested(&self) -> bool {
        false
    }
}

impl CancelSignal for AtomicBool {
    fn is_cancel_requested(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CancelSignal + ?Sized> CancelSignal for std::sync::Arc<T> {
    fn is_cancel_requested(&self) -> bool {
        (**self).is_cancel_requested()
    }
}

impl<T: RangeSensor + ?Sized> RangeSensor for Box<T> {
    fn sample_distance_mm(&mut self) -> f64 {
        (**self).sample_distance_mm()
    }
}

impl<T: Drive + ?Sized> Drive for Box<T> {
    fn set_speed(&mut self, fraction: f64) {
        (**self).set_speed(fraction)
    }

    fn brake(&mut self) {
        (**self).brake()
    }

    fn reset_travel_counter(&mut self) -> i64 {
        (**self).reset_travel_counter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimDrive, SimRangeSensor};
    use std::sync::Arc;

    #[test]
    fn test_cancel_signals() {
        assert!(!NeverCancel.is_cancel_requested());

        let flag = Arc::new(AtomicBool::new(false));
        let shared = flag.clone();
        assert!(!shared.is_cancel_requested());

        flag.store(true, Ordering::Relaxed);
        assert!(shared.is_cancel_requested());
    }

    #[test]
    fn test_boxed_hardware() {
        let mut sensor: Box<dyn RangeSensor> = Box::new(SimRangeSensor::constant(42.0));
        assert_eq!(sensor.sample_distance_mm(), 42.0);

        let mut drive: Box<dyn Drive> = Box::new(SimDrive::kinematic(100.0));
        drive.set_speed(-0.5);
        assert_eq!(drive.reset_travel_counter(), -50);
        drive.brake();
        assert_eq!(drive.reset_travel_counter(), 0);
    }
}
