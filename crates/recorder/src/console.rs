//! Single-line console renderings of the device snapshot.
//!
//! Every line starts with `\r` so successive ticks overwrite each other.

use std::fmt::Write as _;

use emg_sensor::DeviceSnapshot;
use emg_types::Arm;

const POSE_WIDTH: usize = 14;

/// `\r[v   ][v   ]...` with each channel left-aligned in four columns.
pub fn emg_line(snapshot: &DeviceSnapshot) -> String {
    let mut line = String::from("\r");
    push_emg(&mut line, snapshot);
    line
}

/// EMG cells, orientation buckets, then lock, arm and pose.
///
/// Off arm the last three cells are blank with a `?` in place of the arm.
pub fn status_line(snapshot: &DeviceSnapshot) -> String {
    let mut line = String::from("\r");
    push_emg(&mut line, snapshot);
    let o = &snapshot.orientation;
    let _ = write!(line, "[{},{},{}]", o.roll_w, o.pitch_w, o.yaw_w);

    match snapshot.arm {
        Some(arm) => {
            let lock = if snapshot.unlocked { "UL" } else { "LK" };
            let _ = write!(
                line,
                "[{}][{}][{:<width$}]",
                lock,
                arm_marker(arm),
                snapshot.pose.as_str(),
                width = POSE_WIDTH
            );
        }
        None => {
            let _ = write!(line, "[{:8}][?][{:10}]", "", "");
        }
    }
    line
}

fn push_emg(line: &mut String, snapshot: &DeviceSnapshot) {
    for value in snapshot.emg.channels() {
        let _ = write!(line, "[{:<4}]", value);
    }
}

fn arm_marker(arm: Arm) -> char {
    match arm {
        Arm::Left => 'L',
        Arm::Right => 'R',
        Arm::Unknown => '?',
    }
}
