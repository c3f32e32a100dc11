//! # Axis Filter
//!
//! One-dimensional steady-state Kalman-style estimator, one independent
//! instance per sensor axis.
//!
//! Each update:
//!
//! ```text
//! gain     = e_est / (e_est + e_mea)
//! estimate = last + gain * (measurement - last)
//! e_est    = (1 - gain) * e_est + |last - estimate| * q
//! ```
//!
//! ## Usage
//!
//! ```
//! use spacemouse_core::sensor::filter::{AxisFilter, FilterParams};
//!
//! let mut filter = AxisFilter::new(FilterParams::default());
//! filter.seed(2100);
//! assert_eq!(filter.update(2100), 2100);
//! ```

use super::{RawSample, SensorSource, AXIS_COUNT};

/// Fixed gain parameters of the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Expected measurement noise (e_mea).
    pub measurement_error: f32,
    /// Initial estimation error (e_est).
    pub estimation_error: f32,
    /// Process noise (q).
    pub process_noise: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            measurement_error: 5.0,
            estimation_error: 2.0,
            process_noise: 0.01,
        }
    }
}

/// Recursive estimator state for a single axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisFilter {
    err_measure: f32,
    err_estimate: f32,
    q: f32,
    last_estimate: f32,
}

impl AxisFilter {
    /// Creates a filter whose previous estimate is 0.
    #[must_use]
    pub fn new(params: FilterParams) -> Self {
        Self {
            err_measure: params.measurement_error,
            err_estimate: params.estimation_error,
            q: params.process_noise,
            last_estimate: 0.0,
        }
    }

    /// Sets the previous estimate without touching the error covariance.
    ///
    /// Lets the driver start from the first real reading instead of 0.
    pub fn seed(&mut self, value: i32) {
        self.last_estimate = value as f32;
    }

    /// Feeds one measurement and returns the new smoothed value.
    pub fn update(&mut self, measurement: i32) -> i32 {
        let gain = self.err_estimate / (self.err_estimate + self.err_measure);
        let estimate = self.last_estimate + gain * (measurement as f32 - self.last_estimate);
        self.err_estimate =
            (1.0 - gain) * self.err_estimate + (self.last_estimate - estimate).abs() * self.q;
        self.last_estimate = estimate;
        estimate.round() as i32
    }
}

/// The eight per-axis filters, no cross-axis coupling.
#[derive(Debug, Clone)]
pub struct FilterBank {
    filters: [AxisFilter; AXIS_COUNT],
    adc_max: i32,
}

impl FilterBank {
    /// Creates a bank of identical filters.
    #[must_use]
    pub fn new(params: FilterParams, adc_max: i32) -> Self {
        Self {
            filters: [AxisFilter::new(params); AXIS_COUNT],
            adc_max,
        }
    }

    /// Seeds every filter with the corresponding axis of `sample`.
    pub fn seed(&mut self, sample: &RawSample) {
        for (filter, &value) in self.filters.iter_mut().zip(sample.iter()) {
            filter.seed(value);
        }
    }

    /// Filters one raw sample, clamping the result to the ADC domain.
    pub fn apply(&mut self, raw: &RawSample) -> RawSample {
        let mut out = [0; AXIS_COUNT];
        for (i, filter) in self.filters.iter_mut().enumerate() {
            out[i] = filter.update(raw[i]).clamp(0, self.adc_max);
        }
        out
    }

    /// Reads one sample from `source` and filters it.
    pub fn read<S: SensorSource + ?Sized>(&mut self, source: &mut S) -> RawSample {
        let raw = source.read();
        self.apply(&raw)
    }
}
