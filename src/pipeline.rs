//! # Control Cycle
//!
//! One pass from raw sensor readings to the velocity vector handed to the
//! report scheduler:
//!
//! ```text
//! raw ─► filter ─► center ─► normalize ─► kinematics ─► shape ─► arbitrate
//!                                                                  ▲
//!                                                  debounced keys ─┘
//! ```
//!
//! The pipeline owns all per-cycle state (filter estimates, calibration
//! profile, key debouncer). It never fails: every numeric path clamps.
//!
//! While calibrating, normal cycles must not run and no reports are sent.
//! [`Pipeline::mode`] tells the driver which of the two it should call.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::motion::arbitration::Arbiter;
use crate::motion::calibration::{RangeDiscovery, RangeReport, RangeStep, Zeroing, ZeroingReport};
use crate::motion::kinematics::transform;
use crate::motion::normalize::Normalizer;
use crate::motion::response::ResponseShaper;
use crate::motion::{NormalizedAxes, VelocityVector};
use crate::sensor::filter::FilterBank;
use crate::sensor::keys::{ButtonState, KeyDebouncer};
use crate::sensor::{RawSample, SensorSource, AXIS_COUNT};
use crate::telemetry::console::format_literal;

/// Calibration procedure in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationKind {
    /// Blocking zero-point averaging.
    Zeroing,
    /// Per-cycle extent tracking.
    RangeDiscovery,
}

/// What the control loop should be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Regular cycles feeding the report scheduler.
    Normal,
    /// Calibration; the report scheduler is paused.
    Calibrating(CalibrationKind),
}

/// Every stage of one control cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutput {
    /// Unfiltered readings as acquired.
    pub raw: RawSample,
    /// Filtered readings in ADC counts.
    pub filtered: RawSample,
    /// Readings minus zero points, inverted where configured.
    pub centered: [i32; AXIS_COUNT],
    /// Dead-zoned and remapped readings.
    pub normalized: NormalizedAxes,
    /// Shaped and arbitrated velocity.
    pub velocity: VelocityVector,
    /// Debounced keys.
    pub buttons: ButtonState,
}

/// Filter, calibration, response shaping and arbitration for one device.
#[derive(Debug, Clone)]
pub struct Pipeline {
    filters: FilterBank,
    normalizer: Normalizer,
    shaper: ResponseShaper,
    arbiter: Arbiter,
    debouncer: KeyDebouncer,
    adc_max: i32,
    mode: Mode,
    range: Option<RangeDiscovery>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        filters: FilterBank,
        normalizer: Normalizer,
        shaper: ResponseShaper,
        arbiter: Arbiter,
        debouncer: KeyDebouncer,
        adc_max: i32,
    ) -> Self {
        Self {
            filters,
            normalizer,
            shaper,
            arbiter,
            debouncer,
            adc_max,
            mode: Mode::Normal,
            range: None,
        }
    }

    /// Builds the pipeline described by a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SpacemouseError::Profile`] if the calibration
    /// profile is unusable.
    pub fn from_config(config: &Config) -> Result<Self> {
        let adc_max = config.sensors.adc_max;
        let normalizer = Normalizer::new(
            config.calibration.profile(),
            config.response.scale,
            adc_max,
        )?;
        let debouncer = config
            .keys
            .as_ref()
            .map(|k| KeyDebouncer::new(k.count, k.debounce_ms))
            .unwrap_or_else(|| KeyDebouncer::new(0, 0));

        Ok(Self::new(
            FilterBank::new(config.sensors.filter_params(), adc_max),
            normalizer,
            ResponseShaper::from_config(&config.response),
            config.response.arbiter(config.keys.as_ref()),
            debouncer,
            adc_max,
        ))
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The normalizer and its calibration profile.
    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Starts the filters from `raw` instead of 0.
    pub fn seed(&mut self, raw: &RawSample) {
        self.filters.seed(raw);
    }

    /// Runs one full cycle on an unfiltered sample.
    pub fn cycle(&mut self, now_ms: u32, raw: &RawSample, keys: &[bool]) -> CycleOutput {
        let filtered = self.filters.apply(raw);
        let mut output = self.process(now_ms, &filtered, keys);
        output.raw = *raw;
        output
    }

    /// Runs one cycle on an already filtered sample, which is also reported
    /// as the raw sample.
    pub fn process(&mut self, now_ms: u32, filtered: &RawSample, keys: &[bool]) -> CycleOutput {
        let centered = self.normalizer.center(filtered);
        let normalized = self.normalizer.normalize_centered(&centered);
        let shaped = self.shaper.shape(&transform(&normalized));
        let buttons = self.debouncer.update(now_ms, keys).clone();
        let velocity = self.arbiter.apply(&shaped, &buttons);

        CycleOutput {
            raw: *filtered,
            filtered: *filtered,
            centered,
            normalized,
            velocity,
            buttons,
        }
    }

    /// Asks the driver to run zeroing before the next cycle.
    pub fn request_zeroing(&mut self) {
        self.mode = Mode::Calibrating(CalibrationKind::Zeroing);
    }

    /// Averages the knob at rest and adopts the result as zero points.
    ///
    /// Blocks for the whole sampling window. Warnings are logged and
    /// returned but never prevent the new zero points from being used.
    pub fn run_zeroing<S>(&mut self, zeroing: &Zeroing, source: &mut S) -> ZeroingReport
    where
        S: SensorSource + ?Sized,
    {
        self.mode = Mode::Calibrating(CalibrationKind::Zeroing);
        info!("Zeroing: keep the knob still");

        let first = source.read();
        self.filters.seed(&first);
        let filters = &mut self.filters;
        let report = zeroing.run(|| filters.read(&mut *source));

        self.normalizer.set_zero(&report.zero);
        log_zeroing_report(&report);
        self.mode = Mode::Normal;
        report
    }

    /// Arms range discovery; subsequent cycles go to [`Pipeline::step_range`].
    pub fn start_range_discovery(&mut self, mut discovery: RangeDiscovery) {
        discovery.reset();
        self.range = Some(discovery);
        self.mode = Mode::Calibrating(CalibrationKind::RangeDiscovery);
        info!("Range discovery armed: move the knob through its full travel");
    }

    /// Feeds one unfiltered sample to range discovery.
    ///
    /// On completion the measured extents replace the profile's extents if
    /// they form a valid profile, and the pipeline returns to normal mode.
    pub fn step_range(&mut self, now_ms: u32, raw: &RawSample) -> RangeStep {
        let Some(range) = self.range.as_mut() else {
            return RangeStep::Done;
        };

        let filtered = self.filters.apply(raw);
        let centered = self.normalizer.center(&filtered);
        let step = range.step(now_ms, &centered);

        if let RangeStep::Finished(report) = &step {
            log_range_report(report);
            let profile = self
                .normalizer
                .profile()
                .with_extents(&report.min, &report.max);
            match self.normalizer.set_profile(profile, self.adc_max) {
                Ok(()) => info!("Adopted measured extents"),
                Err(e) => warn!("Keeping configured extents: {}", e),
            }
            self.range = None;
            self.mode = Mode::Normal;
        }
        step
    }
}

fn log_zeroing_report(report: &ZeroingReport) {
    info!("zero = {}", format_literal(&report.zero));
    info!("dead_zone = {}", format_literal(&report.dead_zone));
    info!("Suggested dead zone: {}", report.suggested_dead_zone);
    info!(
        "Zeroing took {} ms for {} iterations",
        report.elapsed.as_millis(),
        report.iterations
    );
    for warning in &report.warnings {
        warn!("{}", warning);
    }
}

fn log_range_report(report: &RangeReport) {
    info!("min = {}", format_literal(&report.min));
    info!("max = {}", format_literal(&report.max));
    info!("Ranges: {}", format_literal(&report.ranges));
    info!("Center offset: {}", report.center_offset);
    for warning in &report.warnings {
        warn!("{}", warning);
    }
}
