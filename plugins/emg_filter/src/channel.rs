use std::collections::vec_deque::{self, VecDeque};

use tracing::warn;

use crate::dsp::Smoother;
use crate::FilterError;

/// Smoother for one electrode plus the FIFO of values awaiting export.
///
/// Every successful [`filter`](Self::filter) call appends exactly one value;
/// consumers take them oldest first with [`pop`](Self::pop) or
/// [`drain`](Self::drain). Popping an empty queue yields `None`.
///
/// The queue is unbounded unless a capacity is given. A full bounded queue
/// rejects the sample with [`FilterError::QueueFull`] and leaves both the
/// smoother and the queued values untouched.
#[derive(Debug)]
pub struct ChannelFilter {
    channel: usize,
    smoother: Box<dyn Smoother>,
    output: VecDeque<i32>,
    capacity: Option<usize>,
}

impl ChannelFilter {
    pub fn new(
        channel: usize,
        smoother: Box<dyn Smoother>,
        capacity: Option<usize>,
    ) -> Result<Self, FilterError> {
        if capacity == Some(0) {
            return Err(FilterError::InvalidCapacity);
        }
        Ok(Self {
            channel,
            smoother,
            output: VecDeque::with_capacity(capacity.unwrap_or(64).min(256)),
            capacity,
        })
    }

    /// Fails with [`FilterError::QueueFull`] if the next sample would be rejected.
    pub fn ensure_room(&self) -> Result<(), FilterError> {
        match self.capacity {
            Some(capacity) if self.output.len() >= capacity => {
                Err(FilterError::QueueFull { channel: self.channel, capacity })
            }
            _ => Ok(()),
        }
    }

    /// Smooth one raw sample, queue the result and return it.
    pub fn filter(&mut self, raw: i32) -> Result<i32, FilterError> {
        if let Err(e) = self.ensure_room() {
            warn!(channel = self.channel, "filtered output not consumed, rejecting sample");
            return Err(e);
        }
        let value = self.smoother.smooth(raw);
        self.output.push_back(value);
        Ok(value)
    }

    pub fn pop(&mut self) -> Option<i32> {
        self.output.pop_front()
    }

    pub fn peek(&self) -> Option<i32> {
        self.output.front().copied()
    }

    /// Take every pending value, oldest first.
    pub fn drain(&mut self) -> vec_deque::Drain<'_, i32> {
        self.output.drain(..)
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Clear both the smoother history and the pending values.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.output.clear();
    }
}
