use std::fs;
use std::io::Cursor;

use csv_recorder::{LinePrompt, NoPrompt, SENTINEL_ROW};
use emg_sensor::ScriptedHub;
use emg_types::{DeviceCommand, DeviceEvent, EmgSample, RecorderConfig, SensorError, StreamEmg, TimedEvent};
use myo_recorder::app::{self, View, EXIT_FATAL};
use tempfile::tempdir;

fn capture_config(dir: &std::path::Path) -> RecorderConfig {
    let mut config = RecorderConfig::default();
    config.capture.output_path = dir.join("capture/input.csv");
    config.capture.trigger_path = dir.join("capture/trigger.txt");
    config.capture.ticks_per_round = 5;
    config.capture.handshake_delay_ms = 0;
    config.capture.max_rounds = Some(1);
    config.capture.prompt = false;
    config
}

fn emg_ticks(n: usize) -> Vec<Vec<TimedEvent>> {
    (0..n)
        .map(|i| vec![TimedEvent::new(i as u64, DeviceEvent::Emg(EmgSample([i as i8; 8])))])
        .collect()
}

#[test]
fn unopenable_output_fails_before_any_hub_call() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let mut config = capture_config(dir.path());
    config.capture.output_path = blocker.join("input.csv");
    let mut hub = ScriptedHub::new(emg_ticks(10));

    let err = app::capture(&config, &mut hub, &mut NoPrompt, &mut Vec::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to open capture outputs"));
    assert_eq!(hub.discovery_attempts(), 0);
    assert_eq!(hub.pumps(), 0);

    let mut err_out = Vec::new();
    let code = app::report_fatal(&err, false, &mut Cursor::new(""), &mut err_out);
    assert_eq!(code, EXIT_FATAL);
    assert!(String::from_utf8(err_out).unwrap().starts_with("Error: "));
}

#[test]
fn unopenable_trigger_fails_before_any_hub_call() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let mut config = capture_config(dir.path());
    config.capture.trigger_path = blocker.join("trigger.txt");
    let mut hub = ScriptedHub::new(emg_ticks(10));

    let err = app::capture(&config, &mut hub, &mut NoPrompt, &mut Vec::new()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to open capture outputs"));
    assert!(message.contains("trigger.txt"));
    assert_eq!(hub.discovery_attempts(), 0);
    assert!(hub.commands().is_empty());

    let code = app::report_fatal(&err, false, &mut Cursor::new(""), &mut Vec::new());
    assert_eq!(code, EXIT_FATAL);
}

#[test]
fn missing_device_is_fatal() {
    let dir = tempdir().unwrap();
    let config = capture_config(dir.path());
    let mut hub = ScriptedHub::absent();

    let err = app::capture(&config, &mut hub, &mut NoPrompt, &mut Vec::new()).unwrap_err();
    let sensor = err.downcast_ref::<SensorError>().unwrap();
    assert_eq!(
        *sensor,
        SensorError::DeviceNotFound { timeout_ms: config.hub.device_timeout_ms }
    );
    assert_eq!(hub.discovery_attempts(), 1);

    // Outputs were opened first, so they exist even though no round ran.
    assert!(config.capture.output_path.exists());

    let mut err_out = Vec::new();
    let code = app::report_fatal(&err, true, &mut Cursor::new("\n"), &mut err_out);
    assert_eq!(code, EXIT_FATAL);
    let text = String::from_utf8(err_out).unwrap();
    assert!(text.starts_with("Error: Unable to find an armband"));
    assert!(text.ends_with("Press enter to continue."));
}

#[test]
fn capture_enables_streaming_and_records_a_round() {
    let dir = tempdir().unwrap();
    let config = capture_config(dir.path());
    let mut hub = ScriptedHub::new(emg_ticks(6));

    let summaries = app::capture(&config, &mut hub, &mut NoPrompt, &mut Vec::new()).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].rows, 5);
    assert_eq!(
        hub.commands().first(),
        Some(&DeviceCommand::SetStreamEmg(StreamEmg::Enabled))
    );
    assert_eq!(fs::read_to_string(&config.capture.trigger_path).unwrap(), "1");
    let csv = fs::read_to_string(&config.capture.output_path).unwrap();
    assert_eq!(csv.lines().count(), 6);
}

#[test]
fn line_prompt_gates_each_round() {
    let dir = tempdir().unwrap();
    let mut config = capture_config(dir.path());
    config.capture.prompt = true;
    config.capture.max_rounds = None;
    let mut hub = ScriptedHub::new(emg_ticks(6));

    // One answer, then end of input.
    let mut prompt_out = Vec::new();
    let mut prompt = LinePrompt::new(Cursor::new("go\n"), &mut prompt_out);
    let summaries = app::capture(&config, &mut hub, &mut prompt, &mut Vec::new()).unwrap();
    drop(prompt);

    assert_eq!(summaries.len(), 1);
    let shown = String::from_utf8(prompt_out).unwrap();
    assert_eq!(shown.matches("Enter any value to begin").count(), 2);

    // The unanswered second prompt must not wipe the first round.
    let csv = fs::read_to_string(&config.capture.output_path).unwrap();
    assert_eq!(csv.lines().count(), 6);
    assert_eq!(csv.lines().last(), Some(SENTINEL_ROW));
    assert_eq!(fs::read_to_string(&config.capture.trigger_path).unwrap(), "1");
}

#[test]
fn monitor_prints_one_line_per_tick() {
    let mut hub = ScriptedHub::new(emg_ticks(3));
    let mut out = Vec::new();

    let printed = app::monitor(&RecorderConfig::default(), &mut hub, View::Emg, &mut out, Some(3)).unwrap();
    assert_eq!(printed, 3);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches('\r').count(), 3);
    assert!(text.ends_with("\r[2   ][2   ][2   ][2   ][2   ][2   ][2   ][2   ]"));
    assert_eq!(hub.pumps(), 3);
}

#[test]
fn default_config_file_is_optional() {
    // Integration tests run in the crate directory, which ships no config.json.
    let config = myo_recorder::config::load_config(None).unwrap();
    assert_eq!(config, RecorderConfig::default());
}
