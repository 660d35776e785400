//! Parameters structure for SensorFusion

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use super::{ChannelMap, FusionError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for sensor fusion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FusionParams {

    // ---- BATCH ACQUISITION ----

    /// Number of raw samples taken from each channel per refresh.
    pub sample_size: usize,

    /// Number of samples closest to the batch mean which are averaged into
    /// the refresh's distance. The rest are rejected as outliers.
    pub trusted_count: usize,

    /// Delay before each round of sampling.
    ///
    /// Units: milliseconds
    pub sample_delay_ms: u64,

    // ---- SMOOTHING ----

    /// Capacity of both the current and lagged sliding windows.
    pub window_capacity: usize,

    // ---- WALL CLASSIFICATION ----

    /// Distance below which a wall becomes present.
    ///
    /// Units: millimeters
    pub enter_mm: ChannelMap<f64>,

    /// Distance above which a present wall becomes absent. Must not be less
    /// than `enter_mm`, distances between the two leave the classification
    /// unchanged.
    ///
    /// Units: millimeters
    pub exit_mm: ChannelMap<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FusionParams {

    /// Nominal time covered by one full window, used as the span of the
    /// rate of change estimate.
    ///
    /// Units: seconds
    pub fn window_span_s(&self) -> f64 {
        (self.sample_delay_ms as f64 / 1000.0)
            * self.sample_size as f64
            * self.window_capacity as f64
    }

    /// Check the parameters are self-consistent.
    pub fn validate(&self) -> Result<(), FusionError> {
        if self.sample_size == 0 {
            return Err(FusionError::InvalidParams(
                "sample_size must be at least 1".into()
            ))
        }
        if self.trusted_count == 0 || self.trusted_count > self.sample_size {
            return Err(FusionError::InvalidParams(format!(
                "trusted_count must be between 1 and sample_size ({}), found {}",
                self.sample_size, self.trusted_count
            )))
        }
        if self.window_capacity == 0 {
            return Err(FusionError::InvalidParams(
                "window_capacity must be at least 1".into()
            ))
        }
        if self.sample_delay_ms == 0 {
            return Err(FusionError::InvalidParams(
                "sample_delay_ms must be at least 1 so the rate span is non-zero".into()
            ))
        }
        for (c, enter) in self.enter_mm.iter() {
            if *enter > self.exit_mm[c] {
                return Err(FusionError::InvalidParams(format!(
                    "{:?} enter threshold {} exceeds exit threshold {}",
                    c, enter, self.exit_mm[c]
                )))
            }
        }

        Ok(())
    }
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            sample_size: 5,
            trusted_count: 3,
            sample_delay_ms: 1,
            window_capacity: 4,
            enter_mm: ChannelMap::new(80.0, 80.0, 120.0, 120.0),
            exit_mm: ChannelMap::new(100.0, 100.0, 150.0, 150.0),
        }
    }
}
