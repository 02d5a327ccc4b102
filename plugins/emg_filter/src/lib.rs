//! Per-channel EMG smoothing.
//!
//! Each electrode gets its own [`ChannelFilter`]: a smoother plus a bounded
//! FIFO of filtered values awaiting export. [`FilterBank`] drives all eight
//! channels in lockstep so that every pushed frame yields exactly one row.

pub mod bank;
pub mod channel;
pub mod dsp;

pub use bank::FilterBank;
pub use channel::ChannelFilter;
pub use dsp::{build_smoother, Exponential, LowPass, MovingAverage, Passthrough, Smoother};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("moving average window must be at least 1")]
    InvalidWindow,
    #[error("exponential alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("invalid low-pass parameters: {0}")]
    InvalidLowPass(String),
    #[error("output queue capacity must be at least 1")]
    InvalidCapacity,
    #[error("channel {channel} output queue is full ({capacity} values pending)")]
    QueueFull { channel: usize, capacity: usize },
}
