//! # PID controller module
//!
//! A single-input single-output PID corrector. The motion controller runs
//! several of these at once, each with its own gains and its own definition
//! of error, so the controller itself knows nothing about wheels or walls.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};

// Internal
use crate::clock::{Clock, Timer};
use util::maths::saturate;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Integral accumulation limit used when the gains don't override it.
pub const DEFAULT_MAX_INTEGRAL: f64 = 50.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains for one controller, as found in the parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Override of the integral accumulation limit, [`DEFAULT_MAX_INTEGRAL`]
    /// if not given.
    #[serde(default)]
    pub max_integral: Option<f64>
}

/// A PID controller
#[derive(Debug, Clone, Serialize)]
pub struct PidController {
    /// Time since the previous correction
    #[serde(skip)]
    timer: Timer,

    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Magnitude the integral accumulation is clamped to
    max_integral: f64,

    /// The integral accumulation
    integral: f64,

    /// Previous error
    prev_error: f64,

    /// Set by `start`, corrections are refused until then
    started: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors from misuse of a [`PidController`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PidError {
    #[error("Correction requested from a PID controller which has not been started")]
    NotStarted
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidGains {
    pub const fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d, max_integral: None }
    }

    pub const fn with_max_integral(mut self, max_integral: f64) -> Self {
        self.max_integral = Some(max_integral);
        self
    }
}

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            timer: Timer::new(),
            k_p, k_i, k_d,
            max_integral: DEFAULT_MAX_INTEGRAL,
            integral: 0f64,
            prev_error: 0f64,
            started: false
        }
    }

    /// Create a new controller from a set of parameter gains.
    pub fn from_gains(gains: &PidGains) -> Self {
        let ctrl = Self::new(gains.k_p, gains.k_i, gains.k_d);

        match gains.max_integral {
            Some(m) => ctrl.with_max_integral(m),
            None => ctrl
        }
    }

    /// Override the integral accumulation limit.
    pub fn with_max_integral(mut self, max_integral: f64) -> Self {
        self.max_integral = max_integral.abs();
        self
    }

    /// Replace the gains. May be called at any time, including between
    /// corrections, and does not disturb the accumulated state.
    pub fn configure(&mut self, k_p: f64, k_i: f64, k_d: f64) {
        self.k_p = k_p;
        self.k_i = k_i;
        self.k_d = k_d;
    }

    /// Start the controller with an initial error, resetting the integral.
    ///
    /// Must be called before the first call to `correct`.
    pub fn start<C: Clock + ?Sized>(&mut self, initial_error: f64, clock: &C) {
        self.integral = 0f64;
        self.prev_error = initial_error;
        self.started = true;
        self.timer.start(clock);
    }

    /// Get the correction for the given error.
    ///
    /// This function is time-aware so there is no need to pass in a delta-time
    /// value, the time since the previous correction (or since `start`) is
    /// read from the clock.
    pub fn correct<C: Clock + ?Sized>(
        &mut self,
        error: f64,
        clock: &C
    ) -> Result<f64, PidError> {
        if !self.started {
            return Err(PidError::NotStarted)
        }

        let dt = self.timer.delta_s(clock);

        // If there's no time difference we assume no derivative rather than
        // dividing by zero.
        let deriv = match dt > 0f64 {
            true => (error - self.prev_error) / dt,
            false => 0f64
        };

        // Accumulate the integral term, clamped to prevent windup
        self.integral = saturate(self.integral + error * dt, self.max_integral);

        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        trace!(
            "PID e={:.4} i={:.4} d={:.4} dt={:.6} -> {:.4}",
            error, self.integral, deriv, dt, out
        );

        self.prev_error = error;

        Ok(out)
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The current gains as `(k_p, k_i, k_d)`.
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.k_p, self.k_i, self.k_d)
    }

    /// True once `start` has been called, after which `correct` may be used.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
