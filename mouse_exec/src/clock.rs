//! # Clock module
//!
//! Every timed computation in the core reads time through the [`Clock`]
//! trait, which is passed explicitly to the components that need it. This
//! keeps the controllers deterministic under test, where [`crate::sim::SimClock`]
//! is used instead of [`SystemClock`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::time::micros_to_seconds;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic time source which can also block for a fixed delay.
pub trait Clock {
    /// Microseconds since an arbitrary, fixed epoch. Never decreases.
    fn now_us(&self) -> u64;

    /// Block for the given number of milliseconds.
    fn delay_ms(&self, millis: u64);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Host clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant
}

/// Measures the time between successive reads of a clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    last_us: Option<u64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    fn delay_ms(&self, millis: u64) {
        thread::sleep(Duration::from_millis(millis));
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the timer from the clock's current time.
    pub fn start<C: Clock + ?Sized>(&mut self, clock: &C) {
        self.last_us = Some(clock.now_us());
    }

    /// Seconds since the last call to `start` or `delta_s`, restarting the
    /// timer.
    ///
    /// A timer which was never started reports zero.
    pub fn delta_s<C: Clock + ?Sized>(&mut self, clock: &C) -> f64 {
        let now_us = clock.now_us();
        let dt = self.since(now_us);
        self.last_us = Some(now_us);
        dt
    }

    /// Seconds since the timer was last restarted, without restarting it.
    pub fn elapsed_s<C: Clock + ?Sized>(&self, clock: &C) -> f64 {
        self.since(clock.now_us())
    }

    fn since(&self, now_us: u64) -> f64 {
        match self.last_us {
            Some(t) => micros_to_seconds(now_us.saturating_sub(t)),
            None => 0.0
        }
    }
}
