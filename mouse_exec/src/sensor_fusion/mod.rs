//! # Sensor fusion module
//!
//! Turns noisy, jittery range samples into a stable distance, a stable rate
//! of change and a debounced "wall present" flag for each of the four range
//! channels.
//!
//! Each refresh acquires a batch of raw samples per channel, rejects the
//! samples furthest from the batch mean, and feeds the trusted average
//! through a hysteresis classifier and a pair of sliding windows. The
//! "current" window gives the smoothed distance; the "lagged" window trails
//! it in time so the difference between their averages gives a rate of
//! change over a span much longer than one sample interval. A change in wall
//! classification is a step in the physical signal, so both windows are
//! cleared whenever it happens.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod channel;
mod params;
mod state;
mod window;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use channel::*;
pub use params::FusionParams;
pub use state::*;
pub use window::SlidingWindow;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SensorFusion operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FusionError {
    #[error("Invalid sensor fusion parameters: {0}")]
    InvalidParams(String),

    #[error("Wall classification is not available in direction {0:?}")]
    UnsupportedDirection(RelativeDirection),
}
