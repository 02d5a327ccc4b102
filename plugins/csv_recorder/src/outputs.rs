//! Files written by a capture session.

use std::fs::{self, create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::{Terminator, Writer, WriterBuilder};
use tracing::{debug, info};

use emg_types::CaptureConfig;

use crate::format::TelemetryRow;
use crate::{CaptureError, CaptureResult};

fn ensure_parent(path: &Path) -> CaptureResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_dir_all(parent).map_err(|source| CaptureError::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn create_file(path: &Path) -> CaptureResult<File> {
    File::create(path).map_err(|source| CaptureError::OpenFile {
        path: path.to_path_buf(),
        source,
    })
}

/// A CSV file truncated at the start of every round.
pub struct CsvOutput {
    path: PathBuf,
    writer: Option<Writer<File>>,
    rows: usize,
}

impl CsvOutput {
    /// Create (or truncate) the file, creating missing parent directories.
    pub fn open(path: impl Into<PathBuf>) -> CaptureResult<Self> {
        let path = path.into();
        ensure_parent(&path)?;
        let file = create_file(&path)?;
        debug!("Opened CSV output {}", path.display());
        Ok(Self {
            writer: Some(Self::writer_for(file)),
            path,
            rows: 0,
        })
    }

    fn writer_for(file: File) -> Writer<File> {
        WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written since the round began, sentinel excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Truncate the file for a new round.
    pub fn begin_round(&mut self) -> CaptureResult<()> {
        self.writer = None;
        let file = create_file(&self.path)?;
        self.writer = Some(Self::writer_for(file));
        self.rows = 0;
        Ok(())
    }

    fn writer(&mut self) -> CaptureResult<&mut Writer<File>> {
        match self.writer.as_mut() {
            Some(writer) => Ok(writer),
            None => Err(CaptureError::Io {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotConnected, "round not started"),
            }),
        }
    }

    pub fn write_row(&mut self, row: &TelemetryRow) -> CaptureResult<()> {
        let path = self.path.clone();
        self.writer()?
            .write_record(row.fields())
            .map_err(|source| CaptureError::Write { path, source })?;
        self.rows += 1;
        Ok(())
    }

    /// Write the sentinel row, flush and close the file.
    pub fn finish_round(&mut self) -> CaptureResult<()> {
        let path = self.path.clone();
        let writer = self.writer()?;
        writer
            .write_record(TelemetryRow::sentinel_fields())
            .map_err(|source| CaptureError::Write { path: path.clone(), source })?;
        writer
            .flush()
            .map_err(|source| CaptureError::Io { path, source })?;
        self.writer = None;
        Ok(())
    }
}

/// Counter of completed rounds mirrored into a small text file.
pub struct TriggerFile {
    path: PathBuf,
    counter: u64,
}

impl TriggerFile {
    /// Create (or truncate) the trigger file; the counter starts at zero.
    pub fn open(path: impl Into<PathBuf>) -> CaptureResult<Self> {
        let path = path.into();
        ensure_parent(&path)?;
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| CaptureError::OpenFile { path: path.clone(), source })?;
        Ok(Self { path, counter: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Increment the counter and publish it.
    ///
    /// The value is written to a sibling temp file and renamed into place so
    /// a reader never sees a partially written number.
    pub fn bump(&mut self) -> CaptureResult<u64> {
        let next = self.counter + 1;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let io_err = |source| CaptureError::Io { path: tmp.clone(), source };

        let mut file = create_file(&tmp)?;
        file.write_all(next.to_string().as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|source| CaptureError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.counter = next;
        Ok(next)
    }
}

/// Every file a capture session writes, opened together at startup.
pub struct CaptureOutputs {
    pub filtered: CsvOutput,
    pub raw: Option<CsvOutput>,
    pub trigger: TriggerFile,
    archive_dir: Option<PathBuf>,
}

impl CaptureOutputs {
    pub fn open(config: &CaptureConfig) -> CaptureResult<Self> {
        let filtered = CsvOutput::open(&config.output_path)?;
        let raw = config.raw_output_path.as_ref().map(CsvOutput::open).transpose()?;
        let trigger = TriggerFile::open(&config.trigger_path)?;
        if let Some(dir) = &config.archive_dir {
            create_dir_all(dir).map_err(|source| CaptureError::OpenFile {
                path: dir.clone(),
                source,
            })?;
        }
        info!(
            output = %filtered.path().display(),
            trigger = %trigger.path().display(),
            "capture outputs ready"
        );
        Ok(Self {
            filtered,
            raw,
            trigger,
            archive_dir: config.archive_dir.clone(),
        })
    }

    pub fn begin_round(&mut self) -> CaptureResult<()> {
        self.filtered.begin_round()?;
        if let Some(raw) = self.raw.as_mut() {
            raw.begin_round()?;
        }
        Ok(())
    }

    pub fn write(&mut self, filtered: &TelemetryRow, raw: &TelemetryRow) -> CaptureResult<()> {
        self.filtered.write_row(filtered)?;
        if let Some(out) = self.raw.as_mut() {
            out.write_row(raw)?;
        }
        Ok(())
    }

    pub fn finish_round(&mut self) -> CaptureResult<()> {
        self.filtered.finish_round()?;
        if let Some(raw) = self.raw.as_mut() {
            raw.finish_round()?;
        }
        Ok(())
    }

    /// Copy the finished filtered CSV into the archive directory, if configured.
    pub fn archive(&self, round: u64) -> CaptureResult<Option<PathBuf>> {
        let Some(dir) = &self.archive_dir else {
            return Ok(None);
        };
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let target = dir.join(format!("capture_{:04}_{}.csv", round, timestamp));
        fs::copy(self.filtered.path(), &target).map_err(|source| CaptureError::Io {
            path: target.clone(),
            source,
        })?;
        debug!("Archived round {} to {}", round, target.display());
        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SENTINEL_ROW;
    use emg_sensor::DeviceSnapshot;
    use tempfile::tempdir;

    #[test]
    fn csv_round_ends_with_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/input.csv");
        let mut out = CsvOutput::open(&path).unwrap();
        let row = TelemetryRow::raw(&DeviceSnapshot::new());

        out.write_row(&row).unwrap();
        out.write_row(&row).unwrap();
        out.finish_round().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0,0,0,0,0,0,0,0,0,0,0,0,0,0");
        assert_eq!(*lines.last().unwrap(), SENTINEL_ROW);
        assert!(contents.ends_with("SPACE\n"));
    }

    #[test]
    fn begin_round_truncates_previous_round() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.csv");
        let mut out = CsvOutput::open(&path).unwrap();
        let row = TelemetryRow::raw(&DeviceSnapshot::new());
        out.write_row(&row).unwrap();
        out.finish_round().unwrap();

        out.begin_round().unwrap();
        out.finish_round().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", SENTINEL_ROW));
    }

    #[test]
    fn writing_after_finish_is_an_error() {
        let dir = tempdir().unwrap();
        let mut out = CsvOutput::open(dir.path().join("input.csv")).unwrap();
        out.finish_round().unwrap();
        let row = TelemetryRow::raw(&DeviceSnapshot::new());
        assert!(matches!(out.write_row(&row), Err(CaptureError::Io { .. })));
    }

    #[test]
    fn trigger_counts_rounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trigger.txt");
        let mut trigger = TriggerFile::open(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        assert_eq!(trigger.bump().unwrap(), 1);
        assert_eq!(trigger.bump().unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "2");
        assert!(!dir.path().join("trigger.txt.tmp").exists());
    }

    #[test]
    fn unopenable_path_reports_open_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();
        let result = CsvOutput::open(blocker.join("input.csv"));
        assert!(matches!(result, Err(CaptureError::OpenFile { .. })));
    }

    #[test]
    fn archive_copies_finished_round() {
        let dir = tempdir().unwrap();
        let config = CaptureConfig {
            output_path: dir.path().join("input.csv"),
            trigger_path: dir.path().join("trigger.txt"),
            archive_dir: Some(dir.path().join("archive")),
            ..CaptureConfig::default()
        };
        let mut outputs = CaptureOutputs::open(&config).unwrap();
        outputs.finish_round().unwrap();

        let archived = outputs.archive(7).unwrap().unwrap();
        assert!(archived.file_name().unwrap().to_string_lossy().starts_with("capture_0007_"));
        assert_eq!(fs::read_to_string(archived).unwrap(), format!("{}\n", SENTINEL_ROW));
    }
}
