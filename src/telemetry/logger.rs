//! # Cycle Recorder
//!
//! Writes one JSON object per control cycle to rotating JSONL files:
//!
//! ```text
//! {"timestamp":"2026-10-19T09:12:03.125+00:00","raw":[2600,...],"filtered":[2243,...],"normalized":[0,...],"velocity":[0,0,0,0,0,0],"buttons":[false,false]}
//! ```
//!
//! A new file is started every `max_records_per_file` records; only the
//! newest `max_files_to_keep` files are retained. `raw` holds the samples
//! as acquired, so a recording file replays the session through
//! [`ReplaySource`](crate::sensor::source::ReplaySource).

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::motion::NormalizedAxes;
use crate::pipeline::CycleOutput;
use crate::sensor::RawSample;

const FILE_PREFIX: &str = "spacemouse_";
const FILE_EXTENSION: &str = "jsonl";

/// One recorded control cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    /// RFC 3339 wall-clock time.
    pub timestamp: String,
    /// Unfiltered sample.
    pub raw: RawSample,
    pub filtered: RawSample,
    pub normalized: NormalizedAxes,
    /// `[tx, ty, tz, rx, ry, rz]` after arbitration.
    pub velocity: [i32; 6],
    pub buttons: Vec<bool>,
}

impl CycleRecord {
    #[must_use]
    pub fn from_cycle(output: &CycleOutput) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            raw: output.raw,
            filtered: output.filtered,
            normalized: output.normalized,
            velocity: output.velocity.to_array(),
            buttons: output.buttons.flags().to_vec(),
        }
    }
}

/// Rotating JSONL writer.
pub struct CycleRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_index: u32,
}

impl std::fmt::Debug for CycleRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleRecorder")
            .field("dir", &self.dir)
            .field("records_in_file", &self.records_in_file)
            .field("file_index", &self.file_index)
            .finish_non_exhaustive()
    }
}

impl CycleRecorder {
    /// Creates the log directory if needed. No file is opened until the
    /// first record.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Recording cycles to {}", dir.display());
        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            file_index: 0,
        })
    }

    /// Appends one record, rotating files as needed.
    ///
    /// # Errors
    ///
    /// Returns error on I/O or serialization failure.
    pub fn record(&mut self, record: &CycleRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }
        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Flushes buffered records to disk.
    ///
    /// # Errors
    ///
    /// Returns error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;
        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.file_index,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        debug!("Opening recording file {}", path.display());
        self.writer = Some(BufWriter::new(File::create(&path)?));
        self.records_in_file = 0;
        self.file_index += 1;
        self.prune()
    }

    /// Deletes the oldest recordings beyond the retention limit.
    fn prune(&self) -> Result<()> {
        let mut files = self.recordings()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old recording {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Recording files in the log directory, unsorted.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read.
    pub fn recordings(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_recording = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX))
                && path.extension().is_some_and(|e| e == FILE_EXTENSION);
            if is_recording {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl Drop for CycleRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            debug!("Failed to flush recording on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(n: i32) -> CycleRecord {
        CycleRecord {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            raw: [2100 + n; 8],
            filtered: [2100; 8],
            normalized: [n; 8],
            velocity: [n, 0, 0, 0, 0, -n],
            buttons: vec![n % 2 == 0],
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_new_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let recorder = CycleRecorder::new(&dir, 10, 5).unwrap();
        assert!(dir.is_dir());
        assert!(recorder.recordings().unwrap().is_empty(), "No file before first record");
    }

    #[test]
    fn test_records_are_json_lines() {
        let tmp = TempDir::new().unwrap();
        let mut recorder = CycleRecorder::new(tmp.path(), 100, 5).unwrap();
        recorder.record(&record(1)).unwrap();
        recorder.record(&record(2)).unwrap();
        recorder.flush().unwrap();

        let files = recorder.recordings().unwrap();
        assert_eq!(files.len(), 1);
        let lines = read_lines(&files[0]);
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(value["raw"][0], 2102);
        assert_eq!(value["velocity"][5], -2);
        assert_eq!(value["buttons"][0], true);
        assert_eq!(value["timestamp"], "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_rotation_after_max_records() {
        let tmp = TempDir::new().unwrap();
        let mut recorder = CycleRecorder::new(tmp.path(), 3, 10).unwrap();
        for n in 0..7 {
            recorder.record(&record(n)).unwrap();
        }
        recorder.flush().unwrap();

        let mut files = recorder.recordings().unwrap();
        files.sort();
        assert_eq!(files.len(), 3);
        assert_eq!(read_lines(&files[0]).len(), 3);
        assert_eq!(read_lines(&files[1]).len(), 3);
        assert_eq!(read_lines(&files[2]).len(), 1);
    }

    #[test]
    fn test_old_files_are_pruned() {
        let tmp = TempDir::new().unwrap();
        let mut recorder = CycleRecorder::new(tmp.path(), 1, 2).unwrap();
        for n in 0..5 {
            recorder.record(&record(n)).unwrap();
        }
        recorder.flush().unwrap();

        let mut files = recorder.recordings().unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        let last: serde_json::Value = serde_json::from_str(&read_lines(&files[1])[0]).unwrap();
        assert_eq!(last["normalized"][0], 4, "Newest recording survives");
    }

    #[test]
    fn test_foreign_files_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "keep me").unwrap();
        let mut recorder = CycleRecorder::new(tmp.path(), 1, 1).unwrap();
        for n in 0..3 {
            recorder.record(&record(n)).unwrap();
        }
        assert!(tmp.path().join("notes.txt").exists());
        assert_eq!(recorder.recordings().unwrap().len(), 1);
    }

    #[test]
    fn test_recording_replays_unfiltered_samples() {
        use crate::config::Config;
        use crate::pipeline::Pipeline;
        use crate::sensor::source::ReplaySource;
        use crate::sensor::SensorSource;

        let mut pipeline = Pipeline::from_config(&Config::default()).unwrap();
        pipeline.seed(&[2100; 8]);
        let mut pushed = [2100; 8];
        pushed[0] = 2600;

        let tmp = TempDir::new().unwrap();
        let mut recorder = CycleRecorder::new(tmp.path(), 100, 5).unwrap();
        let first = pipeline.cycle(0, &pushed, &[]);
        let second = pipeline.cycle(1, &[2100; 8], &[]);
        assert_ne!(first.filtered, pushed, "Filter lags the step");
        recorder.record(&CycleRecord::from_cycle(&first)).unwrap();
        recorder.record(&CycleRecord::from_cycle(&second)).unwrap();
        recorder.flush().unwrap();

        let files = recorder.recordings().unwrap();
        let mut replay = ReplaySource::open(&files[0], 4096).unwrap();
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.read(), pushed);
        assert_eq!(replay.read(), [2100; 8]);
    }
}
