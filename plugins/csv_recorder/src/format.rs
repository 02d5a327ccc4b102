//! Row layout of the capture CSV.

use emg_sensor::DeviceSnapshot;
use emg_types::EMG_CHANNELS;

/// Marker closing every capture round.
pub const SENTINEL_MARKER: &str = "SPACE";

/// The full sentinel row as it appears in the file.
pub const SENTINEL_ROW: &str = "0,0,0,0,0,0,0,0,0,0,0,0,0,0,SPACE";

/// Number of numeric columns in a telemetry row.
pub const ROW_FIELDS: usize = EMG_CHANNELS + 6;

/// One tick of telemetry: 8 EMG values, orientation buckets, scaled acceleration.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRow {
    pub emg: [i32; EMG_CHANNELS],
    pub roll_w: i32,
    pub pitch_w: i32,
    pub yaw_w: i32,
    pub accel: [f64; 3],
}

impl TelemetryRow {
    /// Row for `emg` with the orientation and acceleration of `snapshot`.
    pub fn new(emg: [i32; EMG_CHANNELS], snapshot: &DeviceSnapshot) -> Self {
        Self {
            emg,
            roll_w: snapshot.orientation.roll_w,
            pitch_w: snapshot.orientation.pitch_w,
            yaw_w: snapshot.orientation.yaw_w,
            accel: snapshot.accel,
        }
    }

    /// Row with the unfiltered readings of `snapshot`.
    pub fn raw(snapshot: &DeviceSnapshot) -> Self {
        Self::new(snapshot.emg.to_i32(), snapshot)
    }

    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(ROW_FIELDS);
        fields.extend(self.emg.iter().map(i32::to_string));
        fields.extend([self.roll_w, self.pitch_w, self.yaw_w].iter().map(i32::to_string));
        fields.extend(self.accel.iter().map(|&a| format_sig3(a)));
        fields
    }

    pub fn sentinel_fields() -> Vec<&'static str> {
        let mut fields = vec!["0"; ROW_FIELDS];
        fields.push(SENTINEL_MARKER);
        fields
    }
}

/// Format with three significant digits, `%.3g` style.
///
/// Trailing zeros are dropped and exponent notation is used below 1e-4 or
/// from 1e3 upwards, so `39.24` becomes `39.2`, `40.0` becomes `40` and
/// `1234.5` becomes `1.23e+03`.
pub fn format_sig3(value: f64) -> String {
    const PRECISION: i32 = 3;

    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // The exponent after rounding decides the notation.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
