//! Capture rounds driven by the hub's event loop.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use emg_filter::FilterBank;
use emg_sensor::{Hub, SnapshotListener};
use emg_types::{CaptureConfig, UnlockType};

use crate::format::TelemetryRow;
use crate::outputs::CaptureOutputs;
use crate::{CaptureError, CaptureResult};

/// Gate run before each round.
pub trait Prompt {
    /// Block until the operator starts the next round.
    ///
    /// Returns `false` when the operator can no longer answer (end of input).
    fn wait_for_start(&mut self, round: u64) -> io::Result<bool>;
}

/// Starts every round immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn wait_for_start(&mut self, _round: u64) -> io::Result<bool> {
        Ok(true)
    }
}

/// Asks on `output` and waits for any line on `input`.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn wait_for_start(&mut self, _round: u64) -> io::Result<bool> {
        write!(self.output, "Enter any value to begin")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }
        writeln!(self.output, "Starting.")?;
        Ok(true)
    }
}

/// Outcome of one finished round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    /// Trigger counter value published for this round.
    pub round: u64,
    pub rows: usize,
    /// Events dispatched by the hub during the round.
    pub events: usize,
    pub output: PathBuf,
    pub archived: Option<PathBuf>,
}

pub struct CaptureSession {
    config: CaptureConfig,
    tick: Duration,
    outputs: CaptureOutputs,
    bank: FilterBank,
}

impl CaptureSession {
    /// `outputs` must already be open; nothing here touches the device.
    pub fn new(
        config: CaptureConfig,
        tick: Duration,
        outputs: CaptureOutputs,
        bank: FilterBank,
    ) -> CaptureResult<Self> {
        if config.ticks_per_round == 0 {
            return Err(CaptureError::InvalidConfig(
                "ticks_per_round must be at least 1".to_string(),
            ));
        }
        Ok(Self { config, tick, outputs, bank })
    }

    pub fn rounds_completed(&self) -> u64 {
        self.outputs.trigger.counter()
    }

    /// Record one round.
    ///
    /// Returns `None` if the prompt reported that nobody can start the round.
    /// The output files are only truncated once the round actually starts, so
    /// the last finished round keeps its sentinel row.
    pub fn run_round(
        &mut self,
        hub: &mut dyn Hub,
        listener: &mut SnapshotListener,
        prompt: &mut dyn Prompt,
        console: &mut dyn Write,
    ) -> CaptureResult<Option<RoundSummary>> {
        let round = self.rounds_completed() + 1;

        hub.control()?.unlock(UnlockType::Hold)?;
        let mut events = hub.run(self.tick, listener)?;

        if self.config.prompt && !prompt.wait_for_start(round).map_err(CaptureError::Console)? {
            info!(round, "prompt closed, not starting round");
            return Ok(None);
        }

        // The previous round stays on disk until this one is committed to.
        self.outputs.begin_round()?;
        self.bank.reset();

        let ticks = self.config.ticks_per_round;
        let tick_ms = self.tick.as_millis();
        for i in 0..ticks {
            write!(console, "\r\n{}", (ticks - i) as u128 * tick_ms).map_err(CaptureError::Console)?;
            events += hub.run(self.tick, listener)?;

            let snapshot = listener.snapshot();
            self.bank.push(&snapshot.emg)?;
            let filtered = self
                .bank
                .pop_row()
                .ok_or(CaptureError::FilterUnderflow { tick: i })?;
            self.outputs
                .write(&TelemetryRow::new(filtered, snapshot), &TelemetryRow::raw(snapshot))?;
            console.flush().map_err(CaptureError::Console)?;
        }
        writeln!(console).map_err(CaptureError::Console)?;

        let rows = self.outputs.filtered.rows();
        self.outputs.finish_round()?;
        let archived = self.outputs.archive(round)?;
        let counter = self.outputs.trigger.bump()?;
        info!(round = counter, rows, events, "capture round complete");

        if self.config.handshake_delay_ms > 0 {
            debug!("Waiting {} ms for the trigger consumer", self.config.handshake_delay_ms);
            thread::sleep(Duration::from_millis(self.config.handshake_delay_ms));
        }

        Ok(Some(RoundSummary {
            round: counter,
            rows,
            events,
            output: self.outputs.filtered.path().to_path_buf(),
            archived,
        }))
    }

    /// Run rounds until `max_rounds` is reached or the prompt closes.
    pub fn run(
        &mut self,
        hub: &mut dyn Hub,
        listener: &mut SnapshotListener,
        prompt: &mut dyn Prompt,
        console: &mut dyn Write,
    ) -> CaptureResult<Vec<RoundSummary>> {
        let mut summaries = Vec::new();
        while self.config.max_rounds.map_or(true, |max| self.rounds_completed() < max) {
            match self.run_round(hub, listener, prompt, console)? {
                Some(summary) => summaries.push(summary),
                None => break,
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn line_prompt_starts_on_any_line() {
        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new("go\n"), &mut out);
        assert!(prompt.wait_for_start(1).unwrap());
        assert!(!prompt.wait_for_start(2).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Enter any value to beginStarting.\n"));
    }

    #[test]
    fn no_prompt_always_starts() {
        assert!(NoPrompt.wait_for_start(99).unwrap());
    }
}
