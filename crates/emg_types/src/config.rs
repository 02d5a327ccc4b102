//! Configuration types for the recorder
//!
//! Every field carries a serde default so a partial `config.json` only has to
//! name what it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top level recorder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Types of supported device backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HubBackend {
    /// Simulated armband generating synthetic telemetry
    #[default]
    Mock,
}

/// Event hub settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Application identifier announced to the hub
    #[serde(default = "default_application_id")]
    pub application_id: String,
    #[serde(default)]
    pub backend: HubBackend,
    /// How long to wait for an armband at startup
    #[serde(default = "default_device_timeout_ms")]
    pub device_timeout_ms: u64,
    /// Event pump budget per loop iteration
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub mock: MockConfig,
}

fn default_application_id() -> String {
    "org.armband.emg-recorder".to_string()
}
fn default_device_timeout_ms() -> u64 { 10_000 }
fn default_tick_ms() -> u64 { 40 }

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            application_id: default_application_id(),
            backend: HubBackend::default(),
            device_timeout_ms: default_device_timeout_ms(),
            tick_ms: default_tick_ms(),
            mock: MockConfig::default(),
        }
    }
}

/// Settings for the simulated armband
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Whether an armband is available for pairing at all
    #[serde(default = "default_true")]
    pub present: bool,
    /// Simulated time until the armband pairs
    #[serde(default = "default_pairing_delay_ms")]
    pub pairing_delay_ms: u64,
    /// EMG frame rate in Hz
    #[serde(default = "default_emg_rate_hz")]
    pub emg_rate_hz: u32,
    /// Orientation/accelerometer frame rate in Hz
    #[serde(default = "default_imu_rate_hz")]
    pub imu_rate_hz: u32,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_true() -> bool { true }
fn default_pairing_delay_ms() -> u64 { 200 }
fn default_emg_rate_hz() -> u32 { 200 }
fn default_imu_rate_hz() -> u32 { 50 }

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            present: true,
            pairing_delay_ms: default_pairing_delay_ms(),
            emg_rate_hz: default_emg_rate_hz(),
            imu_rate_hz: default_imu_rate_hz(),
            seed: None,
        }
    }
}

/// Smoothing applied independently to each EMG channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmoothingKind {
    /// Emit every sample unchanged
    Passthrough,
    /// Mean of the last `window` samples
    MovingAverage { window: usize },
    /// First order IIR, `y += alpha * (x - y)`
    Exponential { alpha: f32 },
    /// Second order Butterworth low-pass
    LowPass { sample_rate_hz: f32, cutoff_hz: f32 },
}

impl Default for SmoothingKind {
    fn default() -> Self {
        SmoothingKind::MovingAverage { window: 8 }
    }
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub smoothing: SmoothingKind,
    /// Bound on filtered values pending per channel; unbounded when unset.
    /// A full queue rejects new frames instead of discarding old ones.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingKind::default(),
            queue_capacity: None,
        }
    }
}

/// Capture session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Filtered CSV, truncated at the start of every round
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Optional CSV of the unfiltered readings
    #[serde(default)]
    pub raw_output_path: Option<PathBuf>,
    /// File holding the completed round counter
    #[serde(default = "default_trigger_path")]
    pub trigger_path: PathBuf,
    /// Directory receiving a timestamped copy of every finished round
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
    #[serde(default = "default_ticks_per_round")]
    pub ticks_per_round: usize,
    /// Pause after bumping the trigger so the consumer can pick up the round
    #[serde(default = "default_handshake_delay_ms")]
    pub handshake_delay_ms: u64,
    /// Stop after this many rounds; run until interrupted when unset
    #[serde(default)]
    pub max_rounds: Option<u64>,
    /// Wait for operator input before every round
    #[serde(default = "default_true")]
    pub prompt: bool,
}

fn default_output_path() -> PathBuf { PathBuf::from("capture/input.csv") }
fn default_trigger_path() -> PathBuf { PathBuf::from("capture/trigger.txt") }
fn default_ticks_per_round() -> usize { 100 }
fn default_handshake_delay_ms() -> u64 { 500 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            raw_output_path: None,
            trigger_path: default_trigger_path(),
            archive_dir: None,
            ticks_per_round: default_ticks_per_round(),
            handshake_delay_ms: default_handshake_delay_ms(),
            max_rounds: None,
            prompt: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: RecorderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RecorderConfig::default());
        assert_eq!(config.hub.device_timeout_ms, 10_000);
        assert_eq!(config.capture.ticks_per_round, 100);
        assert_eq!(config.filter.smoothing, SmoothingKind::MovingAverage { window: 8 });
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let json = r#"{
            "hub": { "tick_ms": 20, "mock": { "present": false } },
            "filter": { "smoothing": { "kind": "exponential", "alpha": 0.25 } },
            "capture": { "output_path": "/tmp/out.csv", "max_rounds": 3 }
        }"#;
        let config: RecorderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hub.tick_ms, 20);
        assert!(!config.hub.mock.present);
        assert_eq!(config.hub.mock.emg_rate_hz, 200);
        assert_eq!(config.filter.smoothing, SmoothingKind::Exponential { alpha: 0.25 });
        assert_eq!(config.filter.queue_capacity, None);
        assert_eq!(config.capture.output_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.capture.max_rounds, Some(3));
        assert!(config.capture.prompt);
    }

    #[test]
    fn unknown_smoothing_kind_is_rejected() {
        let json = r#"{ "filter": { "smoothing": { "kind": "median" } } }"#;
        assert!(serde_json::from_str::<RecorderConfig>(json).is_err());
    }
}
