use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use emg_types::{
    Arm, DeviceCommand, DeviceEvent, DeviceInfo, MockConfig, Pose, SensorError, StreamEmg,
    TimedEvent, UnlockType, VibrationType, WarmupState, XDirection,
};

use super::mock_data_generator::{gen_orientation, next_pose, SignalModel};
use crate::types::{dispatch, DeviceControl, DeviceListener, Hub};

/// A timed unlock relocks after this long without a new unlock request.
const TIMED_UNLOCK: Duration = Duration::from_secs(2);
/// How long each simulated gesture or rest period lasts.
const POSE_DURATION: Duration = Duration::from_millis(1500);

/// A simulated armband hub that does not access any hardware.
///
/// Telemetry is produced on a background thread and buffered in a bounded
/// channel; [`Hub::run`] drains it on the caller's thread. While nobody
/// pumps the hub the buffer fills and further frames are dropped.
pub struct MockHub {
    application_id: String,
    config: MockConfig,
    control: MockControl,
    events: Option<Receiver<TimedEvent>>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Forwards control requests to the generator thread.
struct MockControl {
    commands: Option<Sender<DeviceCommand>>,
}

impl MockControl {
    fn forward(&mut self, command: DeviceCommand) -> Result<(), SensorError> {
        let tx = self.commands.as_ref().ok_or(SensorError::Disconnected)?;
        tx.send(command).map_err(|_| SensorError::ChannelClosed)
    }
}

impl DeviceControl for MockControl {
    fn set_stream_emg(&mut self, mode: StreamEmg) -> Result<(), SensorError> {
        self.forward(DeviceCommand::SetStreamEmg(mode))
    }

    fn unlock(&mut self, kind: UnlockType) -> Result<(), SensorError> {
        self.forward(DeviceCommand::Unlock(kind))
    }

    fn lock(&mut self) -> Result<(), SensorError> {
        self.forward(DeviceCommand::Lock)
    }

    fn notify_user_action(&mut self) -> Result<(), SensorError> {
        self.forward(DeviceCommand::NotifyUserAction)
    }

    fn vibrate(&mut self, kind: VibrationType) -> Result<(), SensorError> {
        self.forward(DeviceCommand::Vibrate(kind))
    }
}

impl MockHub {
    pub fn new(application_id: impl Into<String>, config: MockConfig) -> Result<Self, SensorError> {
        let application_id = application_id.into();
        if application_id.is_empty() {
            return Err(SensorError::InvalidConfig(
                "application id must not be empty".to_string(),
            ));
        }
        if config.emg_rate_hz == 0 || config.imu_rate_hz == 0 {
            return Err(SensorError::InvalidConfig(
                "sample rates must be greater than 0".to_string(),
            ));
        }
        if config.imu_rate_hz > config.emg_rate_hz {
            return Err(SensorError::InvalidConfig(format!(
                "IMU rate {} Hz exceeds EMG rate {} Hz",
                config.imu_rate_hz, config.emg_rate_hz
            )));
        }

        info!("MockHub '{}' created with config: {:?}", application_id, config);

        Ok(Self {
            application_id,
            config,
            control: MockControl { commands: None },
            events: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Simulated armband".to_string(),
            firmware: "1.5.1970".to_string(),
        }
    }

    fn spawn_generator(&mut self) -> Result<(), SensorError> {
        let capacity = self.config.emg_rate_hz as usize * 2;
        let (event_tx, event_rx) = flume::bounded(capacity);
        let (command_tx, command_rx) = flume::unbounded();

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let generator = Generator::new(
            self.config.clone(),
            event_tx,
            command_rx,
            self.stop_flag.clone(),
            SignalModel::new()?,
            rng,
        );

        let worker = thread::Builder::new()
            .name("mock-armband".to_string())
            .spawn(move || generator.run())
            .map_err(|e| SensorError::HardwareFault(format!("failed to spawn generator: {}", e)))?;

        self.events = Some(event_rx);
        self.control.commands = Some(command_tx);
        self.worker = Some(worker);
        Ok(())
    }

    /// Stop the generator thread and forget the paired armband.
    pub fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        self.control.commands = None;
        self.events = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Mock armband generator thread panicked");
            }
            debug!("MockHub '{}' shutdown complete", self.application_id);
        }
    }
}

impl Hub for MockHub {
    fn wait_for_device(&mut self, timeout: Duration) -> Result<DeviceInfo, SensorError> {
        if self.events.is_some() {
            return Ok(self.device_info());
        }

        let pairing_delay = Duration::from_millis(self.config.pairing_delay_ms);
        if !self.config.present || pairing_delay > timeout {
            thread::sleep(timeout);
            return Err(SensorError::DeviceNotFound {
                timeout_ms: timeout.as_millis() as u64,
            });
        }

        thread::sleep(pairing_delay);
        self.spawn_generator()?;
        info!("Simulated armband paired after {:?}", pairing_delay);
        Ok(self.device_info())
    }

    fn control(&mut self) -> Result<&mut dyn DeviceControl, SensorError> {
        if self.control.commands.is_none() {
            return Err(SensorError::Disconnected);
        }
        Ok(&mut self.control)
    }

    fn run(&mut self, budget: Duration, listener: &mut dyn DeviceListener) -> Result<usize, SensorError> {
        let events = self.events.as_ref().ok_or(SensorError::Disconnected)?;
        let deadline = Instant::now() + budget;
        let mut delivered = 0;
        loop {
            match events.recv_deadline(deadline) {
                Ok(event) => {
                    dispatch(listener, &mut self.control, &event);
                    delivered += 1;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Err(SensorError::Disconnected),
            }
        }
        trace!("Pumped {} events in {:?}", delivered, budget);
        Ok(delivered)
    }
}

impl Drop for MockHub {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State of the simulated armband, owned by the generator thread.
struct Generator {
    config: MockConfig,
    events: Sender<TimedEvent>,
    commands: Receiver<DeviceCommand>,
    stop_flag: Arc<AtomicBool>,
    model: SignalModel,
    rng: StdRng,
    started: Instant,
    streaming: bool,
    unlocked: bool,
    relock_at: Option<Instant>,
    pose: Pose,
    next_pose_at: Instant,
    dropped: u64,
}

impl Generator {
    fn new(
        config: MockConfig,
        events: Sender<TimedEvent>,
        commands: Receiver<DeviceCommand>,
        stop_flag: Arc<AtomicBool>,
        model: SignalModel,
        rng: StdRng,
    ) -> Self {
        let started = Instant::now();
        Self {
            config,
            events,
            commands,
            stop_flag,
            model,
            rng,
            started,
            streaming: false,
            unlocked: false,
            relock_at: None,
            pose: Pose::Rest,
            next_pose_at: started + POSE_DURATION,
            dropped: 0,
        }
    }

    fn run(mut self) {
        let arm_sync = DeviceEvent::ArmSync {
            arm: Arm::Right,
            x_direction: XDirection::TowardWrist,
            rotation: 0.0,
            warmup_state: WarmupState::Warm,
        };
        for event in [DeviceEvent::Paired, DeviceEvent::Connected, arm_sync, DeviceEvent::Locked] {
            if !self.emit(event) {
                return;
            }
        }

        let period = Duration::from_secs_f64(1.0 / f64::from(self.config.emg_rate_hz));
        let imu_every = u64::from((self.config.emg_rate_hz / self.config.imu_rate_hz).max(1));
        let mut tick: u64 = 0;
        let mut next_tick = Instant::now();

        while !self.stop_flag.load(Ordering::Relaxed) {
            if !self.apply_commands() || !self.step(tick, imu_every) {
                break;
            }
            tick += 1;
            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            }
        }

        debug!("Mock armband generator stopped after {} ticks ({} frames dropped)", tick, self.dropped);
    }

    /// Produce one frame period worth of events. Returns false once the hub is gone.
    fn step(&mut self, tick: u64, imu_every: u64) -> bool {
        let now = Instant::now();

        if self.relock_at.is_some_and(|at| now >= at) {
            self.relock_at = None;
            self.unlocked = false;
            if !self.emit(DeviceEvent::Locked) {
                return false;
            }
        }

        if now >= self.next_pose_at {
            self.pose = next_pose(&mut self.rng, self.pose);
            self.next_pose_at = now + POSE_DURATION;
            if !self.emit(DeviceEvent::Pose(self.pose)) {
                return false;
            }
        }

        if self.streaming {
            let emg = self.model.emg(&mut self.rng, self.pose);
            if !self.emit(DeviceEvent::Emg(emg)) {
                return false;
            }
        }

        if tick % imu_every == 0 {
            let t_secs = self.started.elapsed().as_secs_f32();
            let quat = gen_orientation(t_secs);
            let accel = self.model.accelerometer(&mut self.rng, &quat);
            let gyro = self.model.gyroscope(&mut self.rng);
            return self.emit(DeviceEvent::Orientation(quat))
                && self.emit(DeviceEvent::Accelerometer(accel))
                && self.emit(DeviceEvent::Gyroscope(gyro));
        }
        true
    }

    fn apply_commands(&mut self) -> bool {
        while let Ok(command) = self.commands.try_recv() {
            debug!("Mock armband received {:?}", command);
            match command {
                DeviceCommand::SetStreamEmg(mode) => self.streaming = mode == StreamEmg::Enabled,
                DeviceCommand::Unlock(kind) => {
                    self.relock_at = match kind {
                        UnlockType::Timed => Some(Instant::now() + TIMED_UNLOCK),
                        UnlockType::Hold => None,
                    };
                    if !self.unlocked {
                        self.unlocked = true;
                        if !self.emit(DeviceEvent::Unlocked) {
                            return false;
                        }
                    }
                }
                DeviceCommand::Lock => {
                    self.relock_at = None;
                    if self.unlocked {
                        self.unlocked = false;
                        if !self.emit(DeviceEvent::Locked) {
                            return false;
                        }
                    }
                }
                DeviceCommand::NotifyUserAction => debug!("Mock armband: user action acknowledged"),
                DeviceCommand::Vibrate(kind) => debug!("Mock armband: vibrate {:?}", kind),
            }
        }
        true
    }

    /// Queue one event. Returns false once the hub is gone.
    ///
    /// Sample frames are dropped while the buffer is full. State changes
    /// block until the hub drains the buffer, so pose and lock transitions
    /// are never lost.
    fn emit(&mut self, event: DeviceEvent) -> bool {
        let timestamp = self.started.elapsed().as_micros() as u64;
        let droppable = matches!(
            event,
            DeviceEvent::Emg(_)
                | DeviceEvent::Orientation(_)
                | DeviceEvent::Accelerometer(_)
                | DeviceEvent::Gyroscope(_)
        );
        let event = TimedEvent::new(timestamp, event);
        if !droppable {
            return self.events.send(event).is_ok();
        }
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped % 1000 == 1 {
                    warn!("Event buffer full, dropping frames ({} so far)", self.dropped);
                }
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
