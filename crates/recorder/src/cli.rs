use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use emg_types::RecorderConfig;

#[derive(Debug, Parser)]
#[command(name = "myo_recorder", about = "Armband EMG telemetry console and CSV recorder")]
pub struct Cli {
    /// Configuration file (defaults to ./config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Exit on fatal errors without waiting for enter
    #[arg(long, global = true)]
    pub no_pause: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the eight raw EMG channels every tick
    Emg,
    /// Print EMG, orientation buckets, lock state, arm and pose every tick
    Print,
    /// Record filtered EMG rounds to CSV and bump the trigger file after each
    Capture(CaptureArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct CaptureArgs {
    /// Filtered CSV output
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Trigger counter file
    #[arg(long)]
    pub trigger: Option<PathBuf>,

    /// Also write the unfiltered rows to this CSV
    #[arg(long)]
    pub raw_output: Option<PathBuf>,

    /// Stop after this many rounds
    #[arg(long)]
    pub rounds: Option<u64>,

    /// Start every round without waiting for enter
    #[arg(long)]
    pub no_prompt: bool,
}

impl CaptureArgs {
    /// Fold the flags that were given into `config`.
    pub fn apply(&self, config: &mut RecorderConfig) {
        let capture = &mut config.capture;
        if let Some(path) = &self.output {
            capture.output_path = path.clone();
        }
        if let Some(path) = &self.trigger {
            capture.trigger_path = path.clone();
        }
        if let Some(path) = &self.raw_output {
            capture.raw_output_path = Some(path.clone());
        }
        if let Some(rounds) = self.rounds {
            capture.max_rounds = Some(rounds);
        }
        if self.no_prompt {
            capture.prompt = false;
        }
    }
}
