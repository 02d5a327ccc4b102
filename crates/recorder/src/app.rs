//! The three recorder modes and the fatal error path.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use csv_recorder::{CaptureOutputs, CaptureSession, Prompt, RoundSummary};
use emg_filter::FilterBank;
use emg_sensor::{Hub, SnapshotListener};
use emg_types::{DeviceInfo, HubConfig, RecorderConfig, StreamEmg};

use crate::cli::Command;
use crate::console;

/// Process exit status after a fatal error.
pub const EXIT_FATAL: u8 = 1;

/// What the monitor modes print each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Emg,
    Status,
}

/// Find the armband and turn on EMG streaming.
pub fn connect(hub: &mut dyn Hub, config: &HubConfig) -> Result<DeviceInfo> {
    info!("Attempting to find an armband...");
    let device = hub.wait_for_device(Duration::from_millis(config.device_timeout_ms))?;
    info!(name = %device.name, firmware = %device.firmware, "Connected to an armband");
    hub.control()?.set_stream_emg(StreamEmg::Enabled)?;
    Ok(device)
}

/// Pump the hub and print one line per tick.
///
/// Runs until `max_ticks` ticks have been printed, or forever when `None`.
/// Returns the number of ticks printed.
pub fn monitor(
    config: &RecorderConfig,
    hub: &mut dyn Hub,
    view: View,
    out: &mut dyn Write,
    max_ticks: Option<u64>,
) -> Result<u64> {
    connect(hub, &config.hub)?;
    let tick = Duration::from_millis(config.hub.tick_ms);
    let mut listener = SnapshotListener::new();
    let mut printed = 0;

    while max_ticks.map_or(true, |max| printed < max) {
        hub.run(tick, &mut listener)?;
        let line = match view {
            View::Emg => console::emg_line(listener.snapshot()),
            View::Status => console::status_line(listener.snapshot()),
        };
        out.write_all(line.as_bytes())?;
        out.flush()?;
        printed += 1;
    }
    Ok(printed)
}

/// Record capture rounds.
///
/// Every output file is opened before the hub is asked for a device, so an
/// unwritable path fails without touching the armband.
pub fn capture(
    config: &RecorderConfig,
    hub: &mut dyn Hub,
    prompt: &mut dyn Prompt,
    console: &mut dyn Write,
) -> Result<Vec<RoundSummary>> {
    let outputs = CaptureOutputs::open(&config.capture).context("Failed to open capture outputs")?;
    let bank = FilterBank::new(&config.filter).context("Invalid filter configuration")?;

    connect(hub, &config.hub)?;

    let tick = Duration::from_millis(config.hub.tick_ms);
    let mut session = CaptureSession::new(config.capture.clone(), tick, outputs, bank)?;
    let mut listener = SnapshotListener::new();
    let summaries = session.run(hub, &mut listener, prompt, console)?;
    info!(rounds = summaries.len(), "capture finished");
    Ok(summaries)
}

/// Dispatch `command` against an already configured hub.
pub fn run(
    command: &Command,
    config: &RecorderConfig,
    hub: &mut dyn Hub,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Emg => monitor(config, hub, View::Emg, out, None).map(|_| ()),
        Command::Print => monitor(config, hub, View::Status, out, None).map(|_| ()),
        Command::Capture(_) => capture(config, hub, prompt, out).map(|_| ()),
    }
}

/// Report a fatal error and return the exit status.
///
/// Unless `pause` is false, waits for a line on `input` so a console window
/// stays open long enough to read the message.
pub fn report_fatal(
    err: &anyhow::Error,
    pause: bool,
    input: &mut dyn BufRead,
    err_out: &mut dyn Write,
) -> u8 {
    let _ = writeln!(err_out, "Error: {:#}", err);
    if pause {
        let _ = write!(err_out, "Press enter to continue.");
        let _ = err_out.flush();
        let mut line = String::new();
        if let Err(e) = input.read_line(&mut line) {
            warn!("Could not wait for enter: {}", e);
        }
    }
    EXIT_FATAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fatal_report_pauses_by_default() {
        let mut err_out = Vec::new();
        let mut input = Cursor::new("\n");
        let code = report_fatal(&anyhow::anyhow!("boom"), true, &mut input, &mut err_out);
        assert_eq!(code, EXIT_FATAL);
        assert_eq!(String::from_utf8(err_out).unwrap(), "Error: boom\nPress enter to continue.");
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn fatal_report_without_pause_skips_prompt() {
        let mut err_out = Vec::new();
        let err = anyhow::anyhow!("disk full").context("Failed to open capture outputs");
        report_fatal(&err, false, &mut Cursor::new(""), &mut err_out);
        assert_eq!(
            String::from_utf8(err_out).unwrap(),
            "Error: Failed to open capture outputs: disk full\n"
        );
    }
}
