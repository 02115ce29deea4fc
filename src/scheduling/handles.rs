//! Small-integer handle allocation with wrap-around and live-set probing.
//!
//! The allocator itself is not synchronized; `CallTimer` keeps it behind a
//! single lock so allocation and release never interleave.
use std::collections::HashSet;

use crate::TimerError;

use super::task::TimerId;

#[derive(Debug)]
pub struct HandleAllocator {
    counter: u32,
    limit: u32,
    live: HashSet<u32>,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        HandleAllocator::new(u32::MAX)
    }
}

impl HandleAllocator {
    /// New allocator issuing handles in `1..limit`. Limits below 2 are raised to 2.
    pub fn new(limit: u32) -> Self {
        Self {
            counter: 0,
            limit: limit.max(2),
            live: HashSet::new(),
        }
    }

    /// Issues the next free handle after the last one handed out.
    pub fn allocate(&mut self) -> Result<TimerId, TimerError> {
        if self.live.len() as u64 >= u64::from(self.limit) - 1 {
            return Err(TimerError::HandlesExhausted(self.live.len()));
        }
        self.step();
        while self.live.contains(&self.counter) {
            self.step();
        }
        self.live.insert(self.counter);
        Ok(TimerId(self.counter))
    }

    /// Returns `handle` to the pool. Returns `false` if it was not live.
    pub fn release(&mut self, handle: TimerId) -> bool {
        self.live.remove(&handle.0)
    }

    pub fn is_live(&self, handle: TimerId) -> bool {
        self.live.contains(&handle.0)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn step(&mut self) {
        self.counter += 1;
        if self.counter >= self.limit {
            self.counter = 1;
        }
    }
}
