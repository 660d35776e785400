//! Implementations for the SensorFusion state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{
    Channel, ChannelMap, FusionError, FusionParams, RelativeDirection, SlidingWindow
};
use crate::clock::Clock;
use crate::hal::RangeSensor;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sensor fusion state for all four channels.
///
/// The channel history is continuous, so one instance lives for the whole run
/// and is shared by every maneuver.
#[derive(Debug, Clone)]
pub struct SensorFusion {
    params: FusionParams,
    channels: ChannelMap<ChannelState>,
}

/// Filter state of one channel.
#[derive(Debug, Clone)]
struct ChannelState {
    /// Most recent batch distances
    current: SlidingWindow,

    /// Previous smoothed distances, trailing `current` in time
    lagged: SlidingWindow,

    /// Smoothed distance, the average of `current`
    distance_mm: f64,

    /// Rate of change of the smoothed distance
    rate_mms: f64,

    /// Wall classification
    wall: bool,

    /// False until the first batch has been classified
    initialised: bool,
}

/// A snapshot of one channel's fused output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChannelReading {
    /// Smoothed distance.
    ///
    /// Units: millimeters
    pub distance_mm: f64,

    /// Rate of change of the smoothed distance, zero until both windows have
    /// filled since the last wall transition.
    ///
    /// Units: millimeters/second
    pub rate_mms: f64,

    /// True if a wall is present on this channel.
    pub wall: bool,
}

/// What changed during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RefreshReport {
    /// Channels whose wall classification changed.
    pub transitions: ChannelMap<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SensorFusion {

    /// Create the fusion state, validating the parameters.
    pub fn new(params: FusionParams) -> Result<Self, FusionError> {
        params.validate()?;

        let channels = ChannelMap::from_fn(|_| ChannelState::new(params.window_capacity));

        Ok(Self { params, channels })
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    /// Acquire a batch of samples from every channel and fold them into the
    /// filter state.
    ///
    /// Sampling rounds are spaced by the configured sample delay, and every
    /// channel is sampled in each round.
    pub fn refresh<S, C>(
        &mut self,
        sensors: &mut ChannelMap<S>,
        clock: &C
    ) -> RefreshReport
    where
        S: RangeSensor,
        C: Clock + ?Sized
    {
        let mut batches: ChannelMap<Vec<f64>> =
            ChannelMap::from_fn(|_| Vec::with_capacity(self.params.sample_size));

        for _ in 0..self.params.sample_size {
            clock.delay_ms(self.params.sample_delay_ms);
            for (c, sensor) in sensors.iter_mut() {
                batches[c].push(sensor.sample_distance_mm());
            }
        }

        let mut report = RefreshReport::default();

        for c in Channel::ALL.iter() {
            report.transitions[*c] = self.process_batch(*c, &batches[*c]);
        }

        report
    }

    /// Fold one batch of raw samples into a channel's state.
    ///
    /// Returns true if the channel's wall classification changed. Empty
    /// batches are ignored.
    pub fn process_batch(&mut self, channel: Channel, samples: &[f64]) -> bool {
        let distance_mm = match trusted_average(samples, self.params.trusted_count) {
            Some(d) => d,
            None => return false
        };

        let transition = self.channels[channel].update(
            distance_mm,
            self.params.enter_mm[channel],
            self.params.exit_mm[channel],
            self.params.window_span_s()
        );

        if transition {
            debug!(
                "{:?} wall {} at {:.1} mm",
                channel,
                match self.channels[channel].wall {
                    true => "gained",
                    false => "lost"
                },
                distance_mm
            );
        }

        trace!("{:?}: {:?}", channel, self.reading(channel));

        transition
    }

    /// A snapshot of the given channel.
    pub fn reading(&self, channel: Channel) -> ChannelReading {
        let state = &self.channels[channel];

        ChannelReading {
            distance_mm: state.distance_mm,
            rate_mms: state.rate_mms,
            wall: state.wall,
        }
    }

    /// Snapshots of all channels.
    pub fn readings(&self) -> ChannelMap<ChannelReading> {
        ChannelMap::from_fn(|c| self.reading(c))
    }

    pub fn distance_mm(&self, channel: Channel) -> f64 {
        self.channels[channel].distance_mm
    }

    pub fn rate_mms(&self, channel: Channel) -> f64 {
        self.channels[channel].rate_mms
    }

    pub fn is_wall(&self, channel: Channel) -> bool {
        self.channels[channel].wall
    }

    /// Whether there is a wall in the given direction.
    ///
    /// A wall ahead requires both front channels to agree. There is no sensor
    /// facing backwards, so asking about `Back` is an error.
    pub fn is_wall_in_direction(&self, dir: RelativeDirection) -> Result<bool, FusionError> {
        match dir {
            RelativeDirection::Left => Ok(self.is_wall(Channel::Left)),
            RelativeDirection::Right => Ok(self.is_wall(Channel::Right)),
            RelativeDirection::Front => Ok(
                self.is_wall(Channel::FrontLeft) && self.is_wall(Channel::FrontRight)
            ),
            RelativeDirection::Back => Err(FusionError::UnsupportedDirection(dir))
        }
    }

    pub fn is_clear_forward(&self) -> bool {
        !(self.is_wall(Channel::FrontLeft) && self.is_wall(Channel::FrontRight))
    }

    pub fn is_clear_left(&self) -> bool {
        !self.is_wall(Channel::Left)
    }

    pub fn is_clear_right(&self) -> bool {
        !self.is_wall(Channel::Right)
    }
}

impl RefreshReport {
    /// True if any channel changed classification.
    pub fn any_transition(&self) -> bool {
        self.transitions.iter().any(|(_, t)| *t)
    }
}

impl ChannelState {
    fn new(window_capacity: usize) -> Self {
        Self {
            current: SlidingWindow::new(window_capacity),
            lagged: SlidingWindow::new(window_capacity),
            distance_mm: 0.0,
            rate_mms: 0.0,
            wall: false,
            initialised: false,
        }
    }

    /// Classify and smooth one batch distance. Returns true on a wall
    /// transition.
    fn update(&mut self, distance_mm: f64, enter_mm: f64, exit_mm: f64, span_s: f64) -> bool {
        let mut transition = false;

        if !self.initialised {
            self.wall = distance_mm < enter_mm;
            self.initialised = true;
        }
        else if self.wall && distance_mm > exit_mm {
            self.wall = false;
            transition = true;
        }
        else if !self.wall && distance_mm < enter_mm {
            self.wall = true;
            transition = true;
        }

        // History from before a step in the signal is meaningless, restart
        // both windows on the next batch.
        if transition {
            self.current.clear();
            self.lagged.clear();
            self.distance_mm = distance_mm;
            self.rate_mms = 0.0;
            return true;
        }

        if self.current.is_full() {
            self.lagged.push(self.distance_mm);
            self.current.push(distance_mm);
            self.distance_mm = self.current.average().unwrap_or(distance_mm);

            let lagged_mm = self.lagged.average().unwrap_or(self.distance_mm);
            self.rate_mms = (self.distance_mm - lagged_mm) / span_s;
        }
        else {
            while !self.current.is_full() {
                self.current.push(distance_mm);
            }
            while !self.lagged.is_full() {
                self.lagged.push(distance_mm);
            }
            self.distance_mm = self.current.average().unwrap_or(distance_mm);
            self.rate_mms = 0.0;
        }

        false
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Reorder the samples from closest to furthest from `centre`.
///
/// This is a selection, not a sort by value: each step takes the remaining
/// sample closest to the centre, with ties going to the sample seen first.
pub fn order_by_closeness(samples: &[f64], centre: f64) -> Vec<f64> {
    let mut remaining: Vec<f64> = samples.to_vec();
    let mut ordered = Vec::with_capacity(samples.len());

    while !remaining.is_empty() {
        let mut closest = 0;
        for i in 1..remaining.len() {
            if (remaining[i] - centre).abs() < (remaining[closest] - centre).abs() {
                closest = i;
            }
        }
        ordered.push(remaining.remove(closest));
    }

    ordered
}

/// Average of the `trusted_count` samples closest to the batch mean, or
/// `None` for an empty batch.
pub fn trusted_average(samples: &[f64], trusted_count: usize) -> Option<f64> {
    let mean = util::maths::mean(samples)?;
    let ordered = order_by_closeness(samples, mean);
    let n = trusted_count.max(1).min(ordered.len());

    util::maths::mean(&ordered[..n])
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimClock, SimRangeSensor};

    fn fusion() -> SensorFusion {
        SensorFusion::new(FusionParams::default()).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_order_by_closeness() {
        // Mean is 3, ties (2 and 4, 1 and 5) go to the first seen
        let ordered = order_by_closeness(&[5.0, 1.0, 4.0, 3.0, 2.0], 3.0);
        assert_eq!(ordered, vec![3.0, 4.0, 2.0, 5.0, 1.0]);
    }

    #[test]
    fn test_outlier_rejected() {
        let batch = [40.0, 42.0, 44.0, 41.0, 300.0];
        let avg = trusted_average(&batch, batch.len() - 1).unwrap();
        assert!(approx(avg, (40.0 + 42.0 + 44.0 + 41.0) / 4.0));

        // Outlier first in the batch makes no difference
        let batch = [900.0, 50.0, 52.0, 48.0];
        assert!(approx(trusted_average(&batch, 3).unwrap(), 50.0));

        assert_eq!(trusted_average(&[], 3), None);
    }

    #[test]
    fn test_initial_classification() {
        let mut f = fusion();

        assert!(!f.process_batch(Channel::Left, &[50.0; 5]));
        assert!(!f.process_batch(Channel::FrontLeft, &[500.0; 5]));

        assert!(f.is_wall(Channel::Left));
        assert!(!f.is_wall(Channel::FrontLeft));
        assert_eq!(f.distance_mm(Channel::Left), 50.0);
        assert_eq!(f.rate_mms(Channel::Left), 0.0);
    }

    #[test]
    fn test_hysteresis() {
        let mut f = fusion();
        let params = FusionParams::default();
        let enter = params.enter_mm[Channel::Right];
        let exit = params.exit_mm[Channel::Right];

        f.process_batch(Channel::Right, &[enter - 20.0; 5]);
        assert!(f.is_wall(Channel::Right));

        // Anything within the band leaves the wall present
        for i in 1..20 {
            let d = enter + (exit - enter) * (i as f64 / 20.0);
            assert!(!f.process_batch(Channel::Right, &[d; 5]));
            assert!(f.is_wall(Channel::Right));
        }

        // Crossing the exit threshold removes it
        assert!(f.process_batch(Channel::Right, &[exit + 1.0; 5]));
        assert!(!f.is_wall(Channel::Right));

        // And the band doesn't bring it back
        assert!(!f.process_batch(Channel::Right, &[enter + 1.0; 5]));
        assert!(!f.is_wall(Channel::Right));

        assert!(f.process_batch(Channel::Right, &[enter - 1.0; 5]));
        assert!(f.is_wall(Channel::Right));
    }

    #[test]
    fn test_rate_of_change() {
        let mut f = fusion();
        let span_s = f.params().window_span_s();

        // Bootstrap fills both windows, no rate yet
        f.process_batch(Channel::Left, &[50.0; 5]);
        assert_eq!(f.rate_mms(Channel::Left), 0.0);

        // Current window becomes [50, 50, 50, 60], lagged is all 50
        f.process_batch(Channel::Left, &[60.0; 5]);
        assert!(approx(f.distance_mm(Channel::Left), 52.5));
        assert!(approx(f.rate_mms(Channel::Left), 2.5 / span_s));

        // Lagged takes the previous smoothed distance
        f.process_batch(Channel::Left, &[60.0; 5]);
        assert!(approx(f.distance_mm(Channel::Left), 55.0));
        assert!(approx(f.rate_mms(Channel::Left), (55.0 - 50.625) / span_s));
    }

    #[test]
    fn test_transition_clears_history() {
        let mut f = fusion();

        f.process_batch(Channel::Left, &[50.0; 5]);
        f.process_batch(Channel::Left, &[70.0; 5]);
        assert!(f.rate_mms(Channel::Left) > 0.0);

        // Losing the wall resets the rate and restarts the windows
        assert!(f.process_batch(Channel::Left, &[400.0; 5]));
        assert_eq!(f.rate_mms(Channel::Left), 0.0);
        assert_eq!(f.distance_mm(Channel::Left), 400.0);

        // Next batch bootstraps from scratch, so nothing of the old wall leaks
        f.process_batch(Channel::Left, &[410.0; 5]);
        assert_eq!(f.distance_mm(Channel::Left), 410.0);
        assert_eq!(f.rate_mms(Channel::Left), 0.0);
    }

    #[test]
    fn test_refresh_and_directions() {
        let clock = SimClock::new();
        let mut f = fusion();
        let mut sensors = ChannelMap::new(
            SimRangeSensor::constant(40.0),
            SimRangeSensor::constant(500.0),
            SimRangeSensor::constant(60.0),
            SimRangeSensor::constant(60.0),
        );

        let report = f.refresh(&mut sensors, &clock);
        assert!(!report.any_transition());

        // One delay per sampling round
        assert_eq!(clock.now_us(), 5_000);

        assert_eq!(f.is_wall_in_direction(RelativeDirection::Left), Ok(true));
        assert_eq!(f.is_wall_in_direction(RelativeDirection::Right), Ok(false));
        assert_eq!(f.is_wall_in_direction(RelativeDirection::Front), Ok(true));
        assert_eq!(
            f.is_wall_in_direction(RelativeDirection::Back),
            Err(FusionError::UnsupportedDirection(RelativeDirection::Back))
        );
        assert!(!f.is_clear_forward());
        assert!(!f.is_clear_left());
        assert!(f.is_clear_right());

        // Right wall appears
        sensors[Channel::Right] = SimRangeSensor::constant(40.0);
        let report = f.refresh(&mut sensors, &clock);
        assert!(report.any_transition());
        assert!(report.transitions[Channel::Right]);
        assert!(!report.transitions[Channel::Left]);
        assert_eq!(f.readings()[Channel::Right].wall, true);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = FusionParams::default();
        params.window_capacity = 0;
        assert!(SensorFusion::new(params).is_err());
    }
}
