//! # Maze map
//!
//! A compact grid of boolean flags, one per cell, packed 32 to a word. The
//! maze explorer keeps one of these per wall orientation and per visited
//! state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of flags stored in each word of the map.
const BITS_PER_WORD: usize = 32;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A `width x height` grid of flags, all clear on construction.
///
/// Cell `(x, y)` lives at bit `(y*width + x) % 32` of word
/// `(y*width + x) / 32`. Cloning gives a fully independent copy.
///
/// Deserialised maps are checked to hold exactly the words their dimensions
/// need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMazeMap")]
pub struct MazeMap {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

/// Unchecked serialised form of a `MazeMap`.
#[derive(Deserialize)]
struct RawMazeMap {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeMapError {
    #[error("A {0}x{1} map has too many cells to address")]
    TooLarge(usize, usize),

    #[error("A {width}x{height} map needs {expected} words of storage but {found} were given")]
    StorageMismatch {
        width: usize,
        height: usize,
        expected: usize,
        found: usize
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MazeMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; words_for(width * height)],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Set or clear the flag of cell `(x, y)`.
    ///
    /// Coordinates must be within the map.
    pub fn set_flag(&mut self, value: bool, x: usize, y: usize) {
        let (word, bit) = self.locate(x, y);

        if value {
            self.data[word] |= 1 << bit;
        }
        else {
            self.data[word] &= !(1 << bit);
        }
    }

    /// Read the flag of cell `(x, y)`.
    pub fn get_flag(&self, x: usize, y: usize) -> bool {
        let (word, bit) = self.locate(x, y);

        (self.data[word] >> bit) & 1 == 1
    }

    /// Bytes of flag storage held by the map.
    pub fn byte_footprint(&self) -> usize {
        self.data.len() * std::mem::size_of::<u32>()
    }

    fn locate(&self, x: usize, y: usize) -> (usize, usize) {
        debug_assert!(
            x < self.width && y < self.height,
            "Cell ({}, {}) is outside the {}x{} map", x, y, self.width, self.height
        );

        let index = y * self.width + x;
        (index / BITS_PER_WORD, index % BITS_PER_WORD)
    }
}

impl TryFrom<RawMazeMap> for MazeMap {
    type Error = MazeMapError;

    fn try_from(raw: RawMazeMap) -> Result<Self, Self::Error> {
        let cells = raw.width.checked_mul(raw.height)
            .ok_or(MazeMapError::TooLarge(raw.width, raw.height))?;
        let expected = words_for(cells);

        if raw.data.len() != expected {
            return Err(MazeMapError::StorageMismatch {
                width: raw.width,
                height: raw.height,
                expected,
                found: raw.data.len()
            })
        }

        Ok(Self {
            width: raw.width,
            height: raw.height,
            data: raw.data,
        })
    }
}

impl fmt::Display for MazeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", if self.get_flag(x, y) { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Words needed to hold `cells` flags.
fn words_for(cells: usize) -> usize {
    cells / BITS_PER_WORD + (cells % BITS_PER_WORD != 0) as usize
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
