//! Range channel identifiers and the per-channel container

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of range channels on the mouse.
pub const NUM_CHANNELS: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One of the range sensing directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Left,
    Right,
    FrontLeft,
    FrontRight,
}

/// A direction relative to the mouse's heading, used when asking whether
/// there's a wall on a given side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativeDirection {
    Left,
    Front,
    Right,
    /// There is no rear-facing sensor, so this direction can't be classified.
    Back,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One value per [`Channel`], indexed by channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMap<T>([T; NUM_CHANNELS]);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Channel {
    /// All channels, in storage order.
    pub const ALL: [Channel; NUM_CHANNELS] = [
        Channel::Left,
        Channel::Right,
        Channel::FrontLeft,
        Channel::FrontRight,
    ];

    fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
            Channel::FrontLeft => 2,
            Channel::FrontRight => 3,
        }
    }
}

impl<T> ChannelMap<T> {
    pub fn new(left: T, right: T, front_left: T, front_right: T) -> Self {
        Self([left, right, front_left, front_right])
    }

    /// Build a map by evaluating `f` for every channel.
    pub fn from_fn<F: FnMut(Channel) -> T>(mut f: F) -> Self {
        Self([
            f(Channel::Left),
            f(Channel::Right),
            f(Channel::FrontLeft),
            f(Channel::FrontRight),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        (0..NUM_CHANNELS).map(|i| Channel::ALL[i]).zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Channel, &mut T)> {
        (0..NUM_CHANNELS).map(|i| Channel::ALL[i]).zip(self.0.iter_mut())
    }

    /// Apply `f` to each value, producing a new map.
    pub fn map<U, F: FnMut(Channel, &T) -> U>(&self, mut f: F) -> ChannelMap<U> {
        ChannelMap::from_fn(|c| f(c, &self[c]))
    }
}

impl<T: Clone> ChannelMap<T> {
    /// A map holding the same value for every channel.
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<Channel> for ChannelMap<T> {
    type Output = T;

    fn index(&self, channel: Channel) -> &T {
        &self.0[channel.index()]
    }
}

impl<T> IndexMut<Channel> for ChannelMap<T> {
    fn index_mut(&mut self, channel: Channel) -> &mut T {
        &mut self.0[channel.index()]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_channel_map() {
        let mut map = ChannelMap::new(1, 2, 3, 4);
        assert_eq!(map[Channel::Left], 1);
        assert_eq!(map[Channel::FrontRight], 4);

        map[Channel::Right] = 20;
        let doubled = map.map(|_, v| v * 2);
        assert_eq!(doubled, ChannelMap::new(2, 40, 6, 8));

        let order: Vec<Channel> = map.iter().map(|(c, _)| c).collect();
        assert_eq!(order, Channel::ALL.to_vec());

        for (c, v) in map.iter_mut() {
            if c == Channel::FrontLeft {
                *v = 0;
            }
        }
        assert_eq!(map, ChannelMap::new(1, 20, 0, 4));
        assert_eq!(ChannelMap::splat(7u8), ChannelMap::new(7, 7, 7, 7));
    }
}
