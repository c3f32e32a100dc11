//! # Calibration Module
//!
//! Derives the per-axis calibration profile from the sensors themselves.
//!
//! ## Zeroing
//!
//! With the knob at rest, [`Zeroing::run`] discards one warm-up sample and
//! averages the next `iterations` filtered samples per axis. The spread
//! (`max - min`) seen during the window is the per-axis dead-zone estimate.
//! Zeroing blocks the control cycle for its whole window (500 samples take
//! roughly half a second).
//!
//! ## Range Discovery
//!
//! [`RangeDiscovery`] is polled once per control cycle with the centered axis
//! values while the user moves the knob through its full travel:
//!
//! ```text
//! Arm ──pause──► Measure (15 s) ──► Report ──► Done
//! ```
//!
//! The arm step hands a fixed pause back to the caller; every other step
//! returns immediately.
//!
//! ## Warnings
//!
//! Calibration never fails. Suspicious results (axis moved during zeroing,
//! zero point outside the expected band, implausibly small extents) are
//! collected as [`CalibrationWarning`]s for the operator to judge.
//!
//! ## Usage
//!
//! ```
//! use spacemouse_core::motion::calibration::Zeroing;
//!
//! let zeroing = Zeroing::new(10, 50, 2000, 2200);
//! let report = zeroing.run(|| [2100; 8]);
//! assert_eq!(report.zero, [2100; 8]);
//! assert!(report.is_clean());
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{Result, SpacemouseError};
use crate::sensor::{RawSample, AXIS_COUNT, AXIS_NAMES};

/// Calibration of a single axis.
///
/// `min` and `max` are extents relative to `zero` (the centered domain), so a
/// well-assembled axis has `min < 0 < max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisProfile {
    /// Raw reading at rest.
    pub zero: i32,
    /// Most negative centered reading at full travel.
    pub min: i32,
    /// Most positive centered reading at full travel.
    pub max: i32,
    /// Negate the centered value.
    pub invert: bool,
    /// Centered magnitudes below this are noise.
    pub dead_zone: i32,
}

impl Default for AxisProfile {
    fn default() -> Self {
        Self {
            zero: 2100,
            min: -500,
            max: 500,
            invert: false,
            dead_zone: 10,
        }
    }
}

/// Calibration of all eight axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationProfile {
    /// Per-axis calibration, in sample order.
    pub axes: [AxisProfile; AXIS_COUNT],
}

impl CalibrationProfile {
    /// Creates a profile from explicit per-axis values.
    #[must_use]
    pub fn new(axes: [AxisProfile; AXIS_COUNT]) -> Self {
        Self { axes }
    }

    /// Checks the remap preconditions for every axis.
    ///
    /// # Errors
    ///
    /// Returns [`SpacemouseError::Profile`] for the first axis where:
    /// - `dead_zone` is negative
    /// - `max <= dead_zone` or `min >= -dead_zone`
    /// - `zero` lies outside `[0, adc_max]`
    pub fn validate(&self, adc_max: i32) -> Result<()> {
        for (axis, p) in self.axes.iter().enumerate() {
            let fail = |reason: String| Err(SpacemouseError::Profile { axis, reason });
            if p.dead_zone < 0 {
                return fail(format!("dead zone {} is negative", p.dead_zone));
            }
            if p.max <= p.dead_zone {
                return fail(format!("max {} must exceed dead zone {}", p.max, p.dead_zone));
            }
            if p.min >= -p.dead_zone {
                return fail(format!("min {} must be below -{}", p.min, p.dead_zone));
            }
            if p.zero < 0 || p.zero > adc_max {
                return fail(format!("zero {} outside 0..={}", p.zero, adc_max));
            }
        }
        Ok(())
    }

    /// Returns a copy with new zero points.
    #[must_use]
    pub fn with_zero(&self, zero: &RawSample) -> Self {
        let mut profile = *self;
        for (axis, &z) in profile.axes.iter_mut().zip(zero.iter()) {
            axis.zero = z;
        }
        profile
    }

    /// Returns a copy with new centered extents.
    #[must_use]
    pub fn with_extents(&self, min: &[i32; AXIS_COUNT], max: &[i32; AXIS_COUNT]) -> Self {
        let mut profile = *self;
        for (i, axis) in profile.axes.iter_mut().enumerate() {
            axis.min = min[i];
            axis.max = max[i];
        }
        profile
    }
}

/// A calibration result the operator should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationWarning {
    /// Spread during zeroing exceeded the dead-zone warning level.
    AxisMoved { axis: usize, spread: i32 },
    /// Zero point outside the expected band.
    ZeroOutOfBand { axis: usize, zero: i32 },
    /// Negative extent implausibly small.
    SmallMinimum { axis: usize, value: i32 },
    /// Positive extent implausibly small.
    SmallMaximum { axis: usize, value: i32 },
}

impl fmt::Display for CalibrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::AxisMoved { axis, spread } => write!(
                f,
                "{}: spread {} while zeroing. Moved axis?",
                AXIS_NAMES[axis], spread
            ),
            Self::ZeroOutOfBand { axis, zero } => write!(
                f,
                "{}: zero point {} out of band. Axis in idle?",
                AXIS_NAMES[axis], zero
            ),
            Self::SmallMinimum { axis, value } => {
                write!(f, "minValue[{}] {} is small: {}", axis, AXIS_NAMES[axis], value)
            }
            Self::SmallMaximum { axis, value } => {
                write!(f, "maxValue[{}] {} is small: {}", axis, AXIS_NAMES[axis], value)
            }
        }
    }
}

// ==================== Zeroing ====================

/// Blocking zero-point procedure.
#[derive(Debug, Clone, Copy)]
pub struct Zeroing {
    iterations: u32,
    dead_zone_warning: i32,
    center_warning_min: i32,
    center_warning_max: i32,
}

/// Outcome of a zeroing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroingReport {
    /// Mean reading per axis.
    pub zero: RawSample,
    /// Lowest reading per axis during the window.
    pub raw_min: RawSample,
    /// Highest reading per axis during the window.
    pub raw_max: RawSample,
    /// `raw_max - raw_min` per axis.
    pub dead_zone: [i32; AXIS_COUNT],
    /// Largest per-axis spread; a candidate for the configured dead zone.
    pub suggested_dead_zone: i32,
    /// Samples averaged.
    pub iterations: u32,
    /// Wall time spent sampling.
    pub elapsed: Duration,
    /// Anomalies seen during the run.
    pub warnings: Vec<CalibrationWarning>,
}

impl ZeroingReport {
    /// True if no warnings occurred.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl Zeroing {
    /// Creates a zeroing procedure.
    ///
    /// # Arguments
    ///
    /// * `iterations` - Samples to average (500 recommended). 0 is treated as 1.
    /// * `dead_zone_warning` - Spread above which an axis is reported as moved
    /// * `center_warning_min` / `center_warning_max` - Expected band for zero points
    #[must_use]
    pub fn new(
        iterations: u32,
        dead_zone_warning: i32,
        center_warning_min: i32,
        center_warning_max: i32,
    ) -> Self {
        Self {
            iterations: iterations.max(1),
            dead_zone_warning,
            center_warning_min,
            center_warning_max,
        }
    }

    /// Samples `read` `iterations + 1` times and derives zero points.
    ///
    /// `read` must return filtered samples; the first one is discarded.
    pub fn run<F>(&self, mut read: F) -> ZeroingReport
    where
        F: FnMut() -> RawSample,
    {
        let start = Instant::now();
        let mut sum = [0i64; AXIS_COUNT];
        let mut raw_min = [i32::MAX; AXIS_COUNT];
        let mut raw_max = [i32::MIN; AXIS_COUNT];

        let _warm_up = read();
        for _ in 0..self.iterations {
            let sample = read();
            for i in 0..AXIS_COUNT {
                sum[i] += i64::from(sample[i]);
                raw_min[i] = raw_min[i].min(sample[i]);
                raw_max[i] = raw_max[i].max(sample[i]);
            }
        }

        let mut zero = [0; AXIS_COUNT];
        let mut dead_zone = [0; AXIS_COUNT];
        let mut warnings = Vec::new();
        for i in 0..AXIS_COUNT {
            zero[i] = (sum[i] / i64::from(self.iterations)) as i32;
            dead_zone[i] = raw_max[i] - raw_min[i];

            if dead_zone[i] > self.dead_zone_warning {
                warnings.push(CalibrationWarning::AxisMoved {
                    axis: i,
                    spread: dead_zone[i],
                });
            }
            if zero[i] < self.center_warning_min || zero[i] > self.center_warning_max {
                warnings.push(CalibrationWarning::ZeroOutOfBand {
                    axis: i,
                    zero: zero[i],
                });
            }
        }

        ZeroingReport {
            zero,
            raw_min,
            raw_max,
            dead_zone,
            suggested_dead_zone: dead_zone.iter().copied().max().unwrap_or(0),
            iterations: self.iterations,
            elapsed: start.elapsed(),
            warnings,
        }
    }
}

// ==================== Range Discovery ====================

/// Position in the range discovery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeState {
    /// Waiting to reset the extents.
    Arm,
    /// Tracking extents; the start time is set on the first measuring cycle.
    Measure { started_ms: Option<u32> },
    /// Measuring window over, report pending.
    Report,
    /// Finished until [`RangeDiscovery::reset`].
    Done,
}

/// What the caller should do after a range discovery step.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeStep {
    /// Sleep for this long before the next step; the user should start moving the knob.
    Pause(Duration),
    /// Keep moving the knob.
    Measuring { remaining_ms: u32 },
    /// Measurement complete.
    Finished(RangeReport),
    /// Nothing left to do.
    Done,
}

/// Outcome of range discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReport {
    /// Most negative centered value per axis.
    pub min: [i32; AXIS_COUNT],
    /// Most positive centered value per axis.
    pub max: [i32; AXIS_COUNT],
    /// `|min| + |max|` per axis.
    pub ranges: [i32; AXIS_COUNT],
    /// `(max |max| - max |min|) / 2`; how far the travel is shifted off center.
    pub center_offset: i32,
    /// Implausibly small extents.
    pub warnings: Vec<CalibrationWarning>,
}

impl RangeReport {
    /// True if no warnings occurred.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Non-blocking extent tracker polled once per control cycle.
#[derive(Debug, Clone)]
pub struct RangeDiscovery {
    state: RangeState,
    min: [i32; AXIS_COUNT],
    max: [i32; AXIS_COUNT],
    duration_ms: u32,
    arm_delay: Duration,
    warning_level: i32,
    limit: i32,
}

impl RangeDiscovery {
    /// Creates an armed tracker.
    ///
    /// # Arguments
    ///
    /// * `duration_ms` - Length of the measuring window (15000 recommended)
    /// * `arm_delay` - Pause handed back at the arm step
    /// * `warning_level` - Nominal extent magnitude below which extents are suspicious
    /// * `adc_max` - Largest possible centered magnitude
    #[must_use]
    pub fn new(duration_ms: u32, arm_delay: Duration, warning_level: i32, adc_max: i32) -> Self {
        Self {
            state: RangeState::Arm,
            min: [adc_max; AXIS_COUNT],
            max: [-adc_max; AXIS_COUNT],
            duration_ms,
            arm_delay,
            warning_level,
            limit: adc_max,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Re-arms the tracker.
    pub fn reset(&mut self) {
        self.state = RangeState::Arm;
    }

    /// Advances the sequence by one control cycle.
    ///
    /// # Arguments
    ///
    /// * `now_ms` - Monotonic wrapping millisecond clock
    /// * `centered` - Axis values with the zero point subtracted
    pub fn step(&mut self, now_ms: u32, centered: &[i32; AXIS_COUNT]) -> RangeStep {
        match self.state {
            RangeState::Arm => {
                self.min = [self.limit; AXIS_COUNT];
                self.max = [-self.limit; AXIS_COUNT];
                self.state = RangeState::Measure { started_ms: None };
                RangeStep::Pause(self.arm_delay)
            }
            RangeState::Measure { started_ms } => {
                let started = started_ms.unwrap_or(now_ms);
                let elapsed = now_ms.wrapping_sub(started);
                if elapsed < self.duration_ms {
                    for i in 0..AXIS_COUNT {
                        self.min[i] = self.min[i].min(centered[i]);
                        self.max[i] = self.max[i].max(centered[i]);
                    }
                    self.state = RangeState::Measure {
                        started_ms: Some(started),
                    };
                    RangeStep::Measuring {
                        remaining_ms: self.duration_ms - elapsed,
                    }
                } else {
                    self.state = RangeState::Report;
                    RangeStep::Measuring { remaining_ms: 0 }
                }
            }
            RangeState::Report => {
                self.state = RangeState::Done;
                RangeStep::Finished(self.report())
            }
            RangeState::Done => RangeStep::Done,
        }
    }

    fn report(&self) -> RangeReport {
        let mut ranges = [0; AXIS_COUNT];
        let mut largest_max = 0;
        let mut largest_min = 0;
        for i in 0..AXIS_COUNT {
            ranges[i] = self.min[i].abs() + self.max[i].abs();
            largest_max = largest_max.max(self.max[i].abs());
            largest_min = largest_min.max(self.min[i].abs());
        }
        let center_offset = (largest_max - largest_min) / 2;

        let mut warnings = Vec::new();
        for i in 0..AXIS_COUNT {
            if self.min[i].abs() < self.warning_level - center_offset {
                warnings.push(CalibrationWarning::SmallMinimum {
                    axis: i,
                    value: self.min[i],
                });
            }
            if self.max[i].abs() < self.warning_level + center_offset {
                warnings.push(CalibrationWarning::SmallMaximum {
                    axis: i,
                    value: self.max[i],
                });
            }
        }

        RangeReport {
            min: self.min,
            max: self.max,
            ranges,
            center_offset,
            warnings,
        }
    }
}
