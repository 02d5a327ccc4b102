//! Latest-value state of the armband.
//!
//! `DeviceSnapshot` holds no history: each event overwrites the fields it
//! owns through one transition function. `SnapshotListener` is the only
//! writer and is driven by the hub, one event at a time.

use log::{debug, warn};

use emg_types::{Arm, EmgSample, Pose, Quaternion, UnlockType, Vector3, WarmupState, XDirection};

use crate::orientation::{self, OrientationBuckets};
use crate::types::{DeviceControl, DeviceListener};

/// Accelerometer readings are reported in g and recorded scaled by this factor.
pub const ACCEL_SCALE: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub emg: EmgSample,
    pub orientation: OrientationBuckets,
    pub accel: [f64; 3],
    pub pose: Pose,
    /// `None` while the armband is not synced to an arm.
    pub arm: Option<Arm>,
    pub unlocked: bool,
    /// Timestamp of the most recent EMG frame.
    pub last_emg_timestamp: Option<u64>,
    pub emg_frames: u64,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            emg: EmgSample::zeroed(),
            orientation: OrientationBuckets::default(),
            accel: [0.0; 3],
            pose: Pose::Unknown,
            arm: None,
            unlocked: false,
            last_emg_timestamp: None,
            emg_frames: 0,
        }
    }
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_arm(&self) -> bool {
        self.arm.is_some()
    }

    /// Armband went away: clear everything it reported.
    pub fn apply_unpair(&mut self) {
        self.emg = EmgSample::zeroed();
        self.orientation = OrientationBuckets::default();
        self.arm = None;
        self.unlocked = false;
    }

    pub fn apply_emg(&mut self, timestamp: u64, emg: &EmgSample) {
        self.emg = *emg;
        self.last_emg_timestamp = Some(timestamp);
        self.emg_frames += 1;
    }

    pub fn apply_orientation(&mut self, quat: &Quaternion) {
        self.orientation = orientation::buckets(quat);
    }

    pub fn apply_accelerometer(&mut self, accel: &Vector3) {
        self.accel = accel.scaled(ACCEL_SCALE);
    }

    pub fn apply_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn apply_arm_sync(&mut self, arm: Arm) {
        self.arm = Some(arm);
    }

    pub fn apply_arm_unsync(&mut self) {
        self.arm = None;
    }

    pub fn apply_unlock(&mut self) {
        self.unlocked = true;
    }

    pub fn apply_lock(&mut self) {
        self.unlocked = false;
    }
}

/// Listener keeping a [`DeviceSnapshot`] current.
#[derive(Debug, Clone)]
pub struct SnapshotListener {
    snapshot: DeviceSnapshot,
    unlock_on_gesture: bool,
}

impl Default for SnapshotListener {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotListener {
    pub fn new() -> Self {
        Self {
            snapshot: DeviceSnapshot::default(),
            unlock_on_gesture: true,
        }
    }

    /// Disable the hold-unlock on gestures.
    pub fn without_unlock_policy(mut self) -> Self {
        self.unlock_on_gesture = false;
        self
    }

    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }
}

impl DeviceListener for SnapshotListener {
    fn on_unpair(&mut self, _timestamp: u64) {
        debug!("Armband unpaired, clearing snapshot");
        self.snapshot.apply_unpair();
    }

    fn on_arm_sync(
        &mut self,
        _timestamp: u64,
        arm: Arm,
        _x_direction: XDirection,
        _rotation: f32,
        _warmup_state: WarmupState,
    ) {
        self.snapshot.apply_arm_sync(arm);
    }

    fn on_arm_unsync(&mut self, _timestamp: u64) {
        self.snapshot.apply_arm_unsync();
    }

    fn on_unlock(&mut self, _timestamp: u64) {
        self.snapshot.apply_unlock();
    }

    fn on_lock(&mut self, _timestamp: u64) {
        self.snapshot.apply_lock();
    }

    fn on_pose(&mut self, device: &mut dyn DeviceControl, _timestamp: u64, pose: Pose) {
        self.snapshot.apply_pose(pose);
        if !self.unlock_on_gesture {
            return;
        }
        // Hold the unlock while a gesture is performed, otherwise let it time out.
        let result = if pose.is_gesture() {
            device
                .unlock(UnlockType::Hold)
                .and_then(|_| device.notify_user_action())
        } else {
            device.unlock(UnlockType::Timed)
        };
        if let Err(e) = result {
            warn!("Failed to update unlock state after pose {}: {}", pose, e);
        }
    }

    fn on_orientation_data(&mut self, _timestamp: u64, quat: &Quaternion) {
        self.snapshot.apply_orientation(quat);
    }

    fn on_accelerometer_data(&mut self, _timestamp: u64, accel: &Vector3) {
        self.snapshot.apply_accelerometer(accel);
    }

    fn on_emg_data(&mut self, timestamp: u64, emg: &EmgSample) {
        self.snapshot.apply_emg(timestamp, emg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emg_types::{DeviceCommand, SensorError, StreamEmg, VibrationType};

    #[derive(Default)]
    struct RecordingControl {
        commands: Vec<DeviceCommand>,
    }

    impl DeviceControl for RecordingControl {
        fn set_stream_emg(&mut self, mode: StreamEmg) -> Result<(), SensorError> {
            self.commands.push(DeviceCommand::SetStreamEmg(mode));
            Ok(())
        }
        fn unlock(&mut self, kind: UnlockType) -> Result<(), SensorError> {
            self.commands.push(DeviceCommand::Unlock(kind));
            Ok(())
        }
        fn lock(&mut self) -> Result<(), SensorError> {
            self.commands.push(DeviceCommand::Lock);
            Ok(())
        }
        fn notify_user_action(&mut self) -> Result<(), SensorError> {
            self.commands.push(DeviceCommand::NotifyUserAction);
            Ok(())
        }
        fn vibrate(&mut self, kind: VibrationType) -> Result<(), SensorError> {
            self.commands.push(DeviceCommand::Vibrate(kind));
            Ok(())
        }
    }

    #[test]
    fn unpair_clears_reported_state() {
        let mut snapshot = DeviceSnapshot::new();
        snapshot.apply_emg(10, &EmgSample([1, 2, 3, 4, 5, 6, 7, 8]));
        snapshot.apply_arm_sync(Arm::Left);
        snapshot.apply_unlock();
        snapshot.apply_orientation(&Quaternion::IDENTITY);

        snapshot.apply_unpair();

        assert_eq!(snapshot.emg, EmgSample::zeroed());
        assert_eq!(snapshot.orientation, OrientationBuckets::default());
        assert!(!snapshot.on_arm());
        assert!(!snapshot.unlocked);
        // Frame accounting survives an unpair.
        assert_eq!(snapshot.emg_frames, 1);
    }

    #[test]
    fn accelerometer_is_scaled() {
        let mut snapshot = DeviceSnapshot::new();
        snapshot.apply_accelerometer(&Vector3::new(0.5, -0.25, 1.0));
        assert_eq!(snapshot.accel, [20.0, -10.0, 40.0]);
    }

    #[test]
    fn gesture_holds_unlock_and_notifies() {
        let mut listener = SnapshotListener::new();
        let mut control = RecordingControl::default();

        listener.on_pose(&mut control, 1, Pose::Fist);
        listener.on_pose(&mut control, 2, Pose::Rest);

        assert_eq!(listener.snapshot().pose, Pose::Rest);
        assert_eq!(
            control.commands,
            vec![
                DeviceCommand::Unlock(UnlockType::Hold),
                DeviceCommand::NotifyUserAction,
                DeviceCommand::Unlock(UnlockType::Timed),
            ]
        );
    }

    #[test]
    fn unlock_policy_can_be_disabled() {
        let mut listener = SnapshotListener::new().without_unlock_policy();
        let mut control = RecordingControl::default();
        listener.on_pose(&mut control, 1, Pose::WaveIn);
        assert_eq!(listener.snapshot().pose, Pose::WaveIn);
        assert!(control.commands.is_empty());
    }
}
