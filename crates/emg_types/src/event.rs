//! Device events and control commands
//!
//! Events are what a hub delivers to listeners; commands are what listeners
//! and the recorder ask the armband to do in return.

use serde::{Deserialize, Serialize};

use crate::data::{
    Arm, EmgSample, Pose, Quaternion, StreamEmg, UnlockType, Vector3, VibrationType, WarmupState,
    XDirection,
};

/// A single event together with its device timestamp (microseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub timestamp: u64,
    pub event: DeviceEvent,
}

impl TimedEvent {
    pub fn new(timestamp: u64, event: DeviceEvent) -> Self {
        Self { timestamp, event }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEvent {
    Paired,
    Unpaired,
    Connected,
    Disconnected,
    ArmSync {
        arm: Arm,
        x_direction: XDirection,
        rotation: f32,
        warmup_state: WarmupState,
    },
    ArmUnsync,
    Unlocked,
    Locked,
    Pose(Pose),
    Orientation(Quaternion),
    Accelerometer(Vector3),
    Gyroscope(Vector3),
    Emg(EmgSample),
}

/// Control requests a backend forwards to the armband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceCommand {
    SetStreamEmg(StreamEmg),
    Unlock(UnlockType),
    Lock,
    NotifyUserAction,
    Vibrate(VibrationType),
}
