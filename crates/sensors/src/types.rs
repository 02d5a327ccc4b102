//! Common traits for armband backends
//!
//! A backend implements [`Hub`] and hands events to a [`DeviceListener`]
//! while its event loop is pumped. Listeners are plain capability objects
//! registered per `run` call, so the owning loop keeps full control over
//! their state between pumps.

use std::time::Duration;

use emg_types::{
    Arm, DeviceEvent, DeviceInfo, EmgSample, Pose, Quaternion, SensorError, StreamEmg, TimedEvent,
    UnlockType, Vector3, VibrationType, WarmupState, XDirection,
};

/// Control surface of a connected armband.
pub trait DeviceControl {
    fn set_stream_emg(&mut self, mode: StreamEmg) -> Result<(), SensorError>;
    fn unlock(&mut self, kind: UnlockType) -> Result<(), SensorError>;
    fn lock(&mut self) -> Result<(), SensorError>;
    /// Signal that a gesture triggered an action; the armband vibrates.
    fn notify_user_action(&mut self) -> Result<(), SensorError>;
    fn vibrate(&mut self, kind: VibrationType) -> Result<(), SensorError>;
}

/// Callbacks invoked by a hub, all defaulting to no-ops.
#[allow(unused_variables)]
pub trait DeviceListener {
    fn on_pair(&mut self, timestamp: u64) {}
    fn on_unpair(&mut self, timestamp: u64) {}
    fn on_connect(&mut self, timestamp: u64) {}
    fn on_disconnect(&mut self, timestamp: u64) {}
    fn on_arm_sync(
        &mut self,
        timestamp: u64,
        arm: Arm,
        x_direction: XDirection,
        rotation: f32,
        warmup_state: WarmupState,
    ) {
    }
    fn on_arm_unsync(&mut self, timestamp: u64) {}
    fn on_unlock(&mut self, timestamp: u64) {}
    fn on_lock(&mut self, timestamp: u64) {}
    /// The device handle lets a listener react to a gesture, e.g. by holding the unlock.
    fn on_pose(&mut self, device: &mut dyn DeviceControl, timestamp: u64, pose: Pose) {}
    fn on_orientation_data(&mut self, timestamp: u64, quat: &Quaternion) {}
    fn on_accelerometer_data(&mut self, timestamp: u64, accel: &Vector3) {}
    fn on_gyroscope_data(&mut self, timestamp: u64, gyro: &Vector3) {}
    fn on_emg_data(&mut self, timestamp: u64, emg: &EmgSample) {}
}

/// Route one event to the matching listener hook.
pub fn dispatch(listener: &mut dyn DeviceListener, device: &mut dyn DeviceControl, event: &TimedEvent) {
    let ts = event.timestamp;
    match &event.event {
        DeviceEvent::Paired => listener.on_pair(ts),
        DeviceEvent::Unpaired => listener.on_unpair(ts),
        DeviceEvent::Connected => listener.on_connect(ts),
        DeviceEvent::Disconnected => listener.on_disconnect(ts),
        DeviceEvent::ArmSync { arm, x_direction, rotation, warmup_state } => {
            listener.on_arm_sync(ts, *arm, *x_direction, *rotation, *warmup_state)
        }
        DeviceEvent::ArmUnsync => listener.on_arm_unsync(ts),
        DeviceEvent::Unlocked => listener.on_unlock(ts),
        DeviceEvent::Locked => listener.on_lock(ts),
        DeviceEvent::Pose(pose) => listener.on_pose(device, ts, *pose),
        DeviceEvent::Orientation(quat) => listener.on_orientation_data(ts, quat),
        DeviceEvent::Accelerometer(accel) => listener.on_accelerometer_data(ts, accel),
        DeviceEvent::Gyroscope(gyro) => listener.on_gyroscope_data(ts, gyro),
        DeviceEvent::Emg(emg) => listener.on_emg_data(ts, emg),
    }
}

/// An event source for a single armband.
pub trait Hub {
    /// Block until an armband pairs or `timeout` elapses.
    fn wait_for_device(&mut self, timeout: Duration) -> Result<DeviceInfo, SensorError>;

    /// Control handle of the paired armband.
    fn control(&mut self) -> Result<&mut dyn DeviceControl, SensorError>;

    /// Pump the event loop for `budget`, delivering events in order.
    ///
    /// Returns the number of events dispatched.
    fn run(&mut self, budget: Duration, listener: &mut dyn DeviceListener) -> Result<usize, SensorError>;
}
