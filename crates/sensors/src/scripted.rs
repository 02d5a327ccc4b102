//! Deterministic hub replaying a fixed event script.
//!
//! Each call to [`Hub::run`] delivers the next tick of the script regardless
//! of the time budget, which makes capture loops reproducible in tests.

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;

use emg_types::{
    DeviceCommand, DeviceInfo, SensorError, StreamEmg, TimedEvent, UnlockType, VibrationType,
};

use crate::types::{dispatch, DeviceControl, DeviceListener, Hub};

/// Control handle that records every request.
#[derive(Debug, Default, Clone)]
pub struct CommandLog {
    commands: Vec<DeviceCommand>,
}

impl CommandLog {
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }
}

impl DeviceControl for CommandLog {
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

pub struct ScriptedHub {
    ticks: Option<VecDeque<Vec<TimedEvent>>>,
    control: CommandLog,
    connected: bool,
    discovery_attempts: usize,
    pumps: usize,
}

impl ScriptedHub {
    /// A hub whose armband delivers `ticks`, one entry per pump.
    pub fn new(ticks: Vec<Vec<TimedEvent>>) -> Self {
        Self {
            ticks: Some(ticks.into()),
            control: CommandLog::default(),
            connected: false,
            discovery_attempts: 0,
            pumps: 0,
        }
    }

    /// A hub with no armband in range.
    pub fn absent() -> Self {
        Self {
            ticks: None,
            control: CommandLog::default(),
            connected: false,
            discovery_attempts: 0,
            pumps: 0,
        }
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        self.control.commands()
    }

    /// Number of `wait_for_device` calls seen so far.
    pub fn discovery_attempts(&self) -> usize {
        self.discovery_attempts
    }

    pub fn pumps(&self) -> usize {
        self.pumps
    }

    pub fn remaining_ticks(&self) -> usize {
        self.ticks.as_ref().map_or(0, VecDeque::len)
    }
}

impl Hub for ScriptedHub {
    fn wait_for_device(&mut self, timeout: Duration) -> Result<DeviceInfo, SensorError> {
        self.discovery_attempts += 1;
        if self.ticks.is_none() {
            return Err(SensorError::DeviceNotFound {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        self.connected = true;
        Ok(DeviceInfo {
            name: "scripted".to_string(),
            firmware: "0.0.0".to_string(),
        })
    }

    fn control(&mut self) -> Result<&mut dyn DeviceControl, SensorError> {
        if !self.connected {
            return Err(SensorError::Disconnected);
        }
        Ok(&mut self.control)
    }

    fn run(&mut self, _budget: Duration, listener: &mut dyn DeviceListener) -> Result<usize, SensorError> {
        if !self.connected {
            return Err(SensorError::Disconnected);
        }
        self.pumps += 1;
        let tick = self
            .ticks
            .as_mut()
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();
        debug!("Scripted pump {} delivering {} events", self.pumps, tick.len());
        for event in &tick {
            dispatch(listener, &mut self.control, event);
        }
        Ok(tick.len())
    }
}
