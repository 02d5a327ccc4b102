use tracing::{debug, warn};

use emg_types::{EmgSample, FilterConfig, EMG_CHANNELS};

use crate::channel::ChannelFilter;
use crate::dsp::build_smoother;
use crate::FilterError;

/// One [`ChannelFilter`] per electrode, fed and drained in lockstep.
#[derive(Debug)]
pub struct FilterBank {
    channels: Vec<ChannelFilter>,
}

impl FilterBank {
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        let channels = (0..EMG_CHANNELS)
            .map(|ch| ChannelFilter::new(ch, build_smoother(&config.smoothing)?, config.queue_capacity))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(smoothing = ?config.smoothing, capacity = ?config.queue_capacity, "filter bank ready");
        Ok(Self { channels })
    }

    /// Filter one frame on every channel and return the smoothed values.
    ///
    /// The same values are queued for a later [`pop_row`](Self::pop_row).
    /// If any channel is full the frame is rejected on all of them.
    pub fn push(&mut self, sample: &EmgSample) -> Result<[i32; EMG_CHANNELS], FilterError> {
        if let Err(e) = self.channels.iter().try_for_each(ChannelFilter::ensure_room) {
            warn!("filter bank full, rejecting frame: {}", e);
            return Err(e);
        }
        let raw = sample.to_i32();
        let mut out = [0; EMG_CHANNELS];
        for ((slot, channel), value) in out.iter_mut().zip(self.channels.iter_mut()).zip(raw) {
            *slot = channel.filter(value)?;
        }
        Ok(out)
    }

    /// Oldest pending row, or `None` when any channel has nothing queued.
    pub fn pop_row(&mut self) -> Option<[i32; EMG_CHANNELS]> {
        if self.channels.iter().any(ChannelFilter::is_empty) {
            return None;
        }
        let mut row = [0; EMG_CHANNELS];
        for (slot, channel) in row.iter_mut().zip(self.channels.iter_mut()) {
            *slot = channel.pop()?;
        }
        Some(row)
    }

    /// Rows that can currently be popped.
    pub fn pending(&self) -> usize {
        self.channels.iter().map(ChannelFilter::len).min().unwrap_or(0)
    }

    /// Forget smoother history and pending rows on every channel.
    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(ChannelFilter::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emg_types::SmoothingKind;

    fn bank(smoothing: SmoothingKind) -> FilterBank {
        FilterBank::new(&FilterConfig { smoothing, queue_capacity: None }).unwrap()
    }

    #[test]
    fn channels_are_filtered_independently() {
        let mut bank = bank(SmoothingKind::MovingAverage { window: 2 });
        bank.push(&EmgSample([10, 0, -10, 0, 0, 0, 0, 100])).unwrap();
        let second = bank.push(&EmgSample([20, 0, -20, 0, 0, 0, 0, 0])).unwrap();
        assert_eq!(second, [15, 0, -15, 0, 0, 0, 0, 50]);
    }

    #[test]
    fn rows_pop_in_lockstep_and_order() {
        let mut bank = bank(SmoothingKind::Passthrough);
        assert_eq!(bank.pop_row(), None);
        bank.push(&EmgSample([1; 8])).unwrap();
        bank.push(&EmgSample([2; 8])).unwrap();
        assert_eq!(bank.pending(), 2);
        assert_eq!(bank.pop_row(), Some([1; 8]));
        assert_eq!(bank.pop_row(), Some([2; 8]));
        assert_eq!(bank.pop_row(), None);
        assert_eq!(bank.pending(), 0);
    }

    #[test]
    fn invalid_smoothing_fails_construction() {
        let err = FilterBank::new(&FilterConfig {
            smoothing: SmoothingKind::Exponential { alpha: 2.0 },
            queue_capacity: None,
        })
        .unwrap_err();
        assert_eq!(err, FilterError::InvalidAlpha(2.0));
    }

    #[test]
    fn full_bank_rejects_whole_frames() {
        let mut bank = FilterBank::new(&FilterConfig {
            smoothing: SmoothingKind::Passthrough,
            queue_capacity: Some(2),
        })
        .unwrap();
        bank.push(&EmgSample([1; 8])).unwrap();
        bank.push(&EmgSample([2; 8])).unwrap();

        let err = bank.push(&EmgSample([3; 8])).unwrap_err();
        assert_eq!(err, FilterError::QueueFull { channel: 0, capacity: 2 });
        assert_eq!(bank.pending(), 2);
        assert_eq!(bank.pop_row(), Some([1; 8]));
        assert_eq!(bank.push(&EmgSample([3; 8])), Ok([3; 8]));
    }

    #[test]
    fn reset_starts_smoothing_afresh() {
        let mut bank = bank(SmoothingKind::MovingAverage { window: 4 });
        bank.push(&EmgSample([100; 8])).unwrap();
        bank.reset();
        assert_eq!(bank.pending(), 0);
        assert_eq!(bank.push(&EmgSample([-8; 8])), Ok([-8; 8]));
    }
}
