//! CSV capture of filtered armband telemetry.
//!
//! A capture round pumps the hub for a fixed number of ticks, writes one row
//! per tick, terminates the file with a sentinel row and then bumps a
//! trigger counter file so an external consumer knows the round is complete.

pub mod format;
pub mod outputs;
pub mod session;

pub use format::{format_sig3, TelemetryRow, SENTINEL_MARKER, SENTINEL_ROW};
pub use outputs::{CaptureOutputs, CsvOutput, TriggerFile};
pub use session::{CaptureSession, LinePrompt, NoPrompt, Prompt, RoundSummary};

use std::io;
use std::path::PathBuf;

use emg_filter::FilterError;
use emg_types::SensorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open output file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write CSV file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Console error: {0}")]
    Console(#[source] io::Error),

    #[error("Device error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("No filtered row available at tick {tick}")]
    FilterUnderflow { tick: usize },

    #[error("Invalid capture configuration: {0}")]
    InvalidConfig(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
