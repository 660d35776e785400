//! Fixed-capacity sliding window of distances

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A first-in first-out window holding at most `capacity` values. Pushing to
/// a full window drops the oldest value.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    buff: VecDeque<f64>,
    capacity: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            buff: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.buff.len() == self.capacity {
            self.buff.pop_front();
        }
        self.buff.push_back(value);
    }

    pub fn clear(&mut self) {
        self.buff.clear();
    }

    pub fn is_full(&self) -> bool {
        self.buff.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.buff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buff.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Average of the values currently held, `None` if empty.
    pub fn average(&self) -> Option<f64> {
        match self.buff.len() {
            0 => None,
            n => Some(self.buff.iter().sum::<f64>() / n as f64),
        }
    }
}
