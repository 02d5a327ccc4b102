use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of EMG electrodes on the armband.
pub const EMG_CHANNELS: usize = 8;

/// One raw EMG frame, a signed 8-bit reading per electrode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmgSample(pub [i8; EMG_CHANNELS]);

impl EmgSample {
    pub fn zeroed() -> Self {
        Self([0; EMG_CHANNELS])
    }

    pub fn channels(&self) -> &[i8; EMG_CHANNELS] {
        &self.0
    }

    /// Widened copy of the readings, as consumed by the filters.
    pub fn to_i32(&self) -> [i32; EMG_CHANNELS] {
        self.0.map(i32::from)
    }
}

/// Unit quaternion reported by the orientation sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Three-axis reading (accelerometer in g, gyroscope in deg/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(&self, factor: f64) -> [f64; 3] {
        [
            f64::from(self.x) * factor,
            f64::from(self.y) * factor,
            f64::from(self.z) * factor,
        ]
    }
}

/// Gesture classified by the armband.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pose {
    Rest,
    Fist,
    WaveIn,
    WaveOut,
    FingersSpread,
    DoubleTap,
    #[default]
    Unknown,
}

impl Pose {
    pub const GESTURES: [Pose; 5] = [
        Pose::Fist,
        Pose::WaveIn,
        Pose::WaveOut,
        Pose::FingersSpread,
        Pose::DoubleTap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pose::Rest => "rest",
            Pose::Fist => "fist",
            Pose::WaveIn => "waveIn",
            Pose::WaveOut => "waveOut",
            Pose::FingersSpread => "fingersSpread",
            Pose::DoubleTap => "doubleTap",
            Pose::Unknown => "unknown",
        }
    }

    /// True for poses that count as a deliberate gesture.
    pub fn is_gesture(&self) -> bool {
        !matches!(self, Pose::Rest | Pose::Unknown)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Arm {
    Left,
    Right,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum XDirection {
    TowardWrist,
    TowardElbow,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarmupState {
    Unknown,
    Cold,
    Warm,
}

/// How long an unlock request keeps the armband unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnlockType {
    /// Relocks after a short period of inactivity.
    Timed,
    /// Stays unlocked until told otherwise.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VibrationType {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamEmg {
    Enabled,
    Disabled,
}

/// Identity of a paired armband as reported by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub firmware: String,
}
