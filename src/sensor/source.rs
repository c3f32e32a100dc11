//! # Acquisition Sources
//!
//! Sources that stand in for the ADC when the core runs on a host:
//!
//! - [`IdleSource`] returns the same sample forever (a knob at rest)
//! - [`ReplaySource`] loops over samples recorded as JSON lines
//!
//! ## Replay Format
//!
//! One JSON array of eight integers per line, blank lines ignored:
//!
//! ```text
//! [2100, 2100, 2100, 2100, 2100, 2100, 2100, 2100]
//! [2600, 2100, 2100, 2100, 2100, 2100, 2100, 2100]
//! ```
//!
//! Lines may also be cycle records written by
//! [`CycleRecorder`](crate::telemetry::logger::CycleRecorder); their `raw`
//! field is replayed and everything else is ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::{RawSample, SensorSource};
use crate::error::{Result, SpacemouseError};

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Sample(RawSample),
    Record { raw: RawSample },
}

impl ReplayLine {
    fn into_sample(self) -> RawSample {
        match self {
            Self::Sample(sample) | Self::Record { raw: sample } => sample,
        }
    }
}

/// Constant sample source.
#[derive(Debug, Clone)]
pub struct IdleSource {
    sample: RawSample,
}

impl IdleSource {
    /// Creates a source that always yields `sample`.
    #[must_use]
    pub fn new(sample: RawSample) -> Self {
        Self { sample }
    }
}

impl SensorSource for IdleSource {
    fn read(&mut self) -> RawSample {
        self.sample
    }
}

/// Loops over a fixed list of recorded samples.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    samples: Vec<RawSample>,
    position: usize,
}

impl ReplaySource {
    /// Loads a JSONL replay file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The file cannot be read
    /// - A line is not an array of eight integers
    /// - A value lies outside `[0, adc_max]`
    /// - The file holds no samples
    pub fn open<P: AsRef<Path>>(path: P, adc_max: i32) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let source = Self::parse(&contents, adc_max)?;
        info!(
            "Loaded {} replay samples from {}",
            source.samples.len(),
            path.as_ref().display()
        );
        Ok(source)
    }

    /// Parses JSONL replay text.
    pub fn parse(contents: &str, adc_max: i32) -> Result<Self> {
        let mut samples = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let sample = serde_json::from_str::<ReplayLine>(line)?.into_sample();
            if let Some(value) = sample.iter().find(|&&v| v < 0 || v > adc_max) {
                return Err(SpacemouseError::Replay(format!(
                    "line {}: value {} outside 0..={}",
                    line_no + 1,
                    value,
                    adc_max
                )));
            }
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SpacemouseError::Replay("replay contains no samples".to_string()));
        }

        Ok(Self {
            samples,
            position: 0,
        })
    }

    /// Number of recorded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; an empty replay is rejected at load time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SensorSource for ReplaySource {
    fn read(&mut self) -> RawSample {
        let sample = self.samples[self.position];
        self.position = (self.position + 1) % self.samples.len();
        sample
    }
}
