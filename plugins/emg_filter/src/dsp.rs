//! Smoothing kernels for integer EMG streams
//!
//! Every kernel consumes one raw sample and produces exactly one smoothed
//! sample. State is local to a channel; nothing is shared across channels.

use std::collections::VecDeque;
use std::fmt;

use biquad::{Biquad, Coefficients, DirectForm2Transposed as DF2T, ToHertz, Type, Q_BUTTERWORTH_F32};
use emg_types::SmoothingKind;

use crate::FilterError;

pub trait Smoother: Send + fmt::Debug {
    /// Consume one raw sample and return its smoothed value.
    fn smooth(&mut self, raw: i32) -> i32;

    /// Forget all history.
    fn reset(&mut self);
}

/// Build the smoother described by `kind`, validating its parameters.
pub fn build_smoother(kind: &SmoothingKind) -> Result<Box<dyn Smoother>, FilterError> {
    Ok(match *kind {
        SmoothingKind::Passthrough => Box::new(Passthrough),
        SmoothingKind::MovingAverage { window } => Box::new(MovingAverage::new(window)?),
        SmoothingKind::Exponential { alpha } => Box::new(Exponential::new(alpha)?),
        SmoothingKind::LowPass { sample_rate_hz, cutoff_hz } => {
            Box::new(LowPass::new(sample_rate_hz, cutoff_hz)?)
        }
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Smoother for Passthrough {
    fn smooth(&mut self, raw: i32) -> i32 {
        raw
    }

    fn reset(&mut self) {}
}

/// Mean over the most recent `window` samples (fewer until the window fills).
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    history: VecDeque<i32>,
    sum: i64,
}

impl MovingAverage {
    pub fn new(window: usize) -> Result<Self, FilterError> {
        if window == 0 {
            return Err(FilterError::InvalidWindow);
        }
        Ok(Self {
            window,
            history: VecDeque::with_capacity(window),
            sum: 0,
        })
    }
}

impl Smoother for MovingAverage {
    fn smooth(&mut self, raw: i32) -> i32 {
        if self.history.len() == self.window {
            if let Some(oldest) = self.history.pop_front() {
                self.sum -= i64::from(oldest);
            }
        }
        self.history.push_back(raw);
        self.sum += i64::from(raw);
        // Rounds half away from zero.
        (self.sum as f64 / self.history.len() as f64).round() as i32
    }

    fn reset(&mut self) {
        self.history.clear();
        self.sum = 0;
    }
}

/// First order IIR low-pass; the first sample seeds the state.
#[derive(Debug, Clone)]
pub struct Exponential {
    alpha: f32,
    state: Option<f32>,
}

impl Exponential {
    pub fn new(alpha: f32) -> Result<Self, FilterError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(FilterError::InvalidAlpha(alpha));
        }
        Ok(Self { alpha, state: None })
    }
}

impl Smoother for Exponential {
    fn smooth(&mut self, raw: i32) -> i32 {
        let x = raw as f32;
        let y = match self.state {
            Some(prev) => prev + self.alpha * (x - prev),
            None => x,
        };
        self.state = Some(y);
        y.round() as i32
    }

    fn reset(&mut self) {
        self.state = None;
    }
}

/// Second order Butterworth low-pass.
pub struct LowPass {
    coeffs: Coefficients<f32>,
    stage: DF2T<f32>,
}

impl LowPass {
    pub fn new(sample_rate_hz: f32, cutoff_hz: f32) -> Result<Self, FilterError> {
        if !(sample_rate_hz > 0.0) {
            return Err(FilterError::InvalidLowPass("sample rate must be > 0".to_string()));
        }
        if !(cutoff_hz > 0.0 && cutoff_hz < sample_rate_hz * 0.5) {
            return Err(FilterError::InvalidLowPass(format!(
                "cutoff {} Hz must be in (0, {}) Hz",
                cutoff_hz,
                sample_rate_hz * 0.5
            )));
        }
        let coeffs = Coefficients::<f32>::from_params(
            Type::LowPass,
            sample_rate_hz.hz(),
            cutoff_hz.hz(),
            Q_BUTTERWORTH_F32,
        )
        .map_err(|e| FilterError::InvalidLowPass(format!("LP coeffs: {:?}", e)))?;
        Ok(Self {
            coeffs,
            stage: DF2T::<f32>::new(coeffs),
        })
    }
}

impl fmt::Debug for LowPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LowPass")
            .field("b0", &self.coeffs.b0)
            .field("a1", &self.coeffs.a1)
            .field("a2", &self.coeffs.a2)
            .finish()
    }
}

impl Smoother for LowPass {
    fn smooth(&mut self, raw: i32) -> i32 {
        self.stage.run(raw as f32).round() as i32
    }

    fn reset(&mut self) {
        self.stage = DF2T::<f32>::new(self.coeffs);
    }
}
