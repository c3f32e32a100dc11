//! # Debug Console Output
//!
//! Human-readable dumps of pipeline stages for tuning on the bench, throttled
//! so the console never sets the pace of the control cycle.
//!
//! ```text
//! H0: 2101  H1: 2098  H2: 2103  H3: 2100  H6: 2099  H7: 2101  H8: 2100  H9: 2102
//! TX:   12  TY:    0  TZ:  -40  RX:    0  RY:    3  RZ:    0
//! ```

use serde::Deserialize;

use crate::motion::{VelocityVector, VELOCITY_NAMES};
use crate::sensor::keys::ButtonState;
use crate::sensor::{AXIS_COUNT, AXIS_NAMES};

/// Stage the debug console dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    #[default]
    Off,
    /// Filtered ADC readings.
    Raw,
    /// Readings minus zero points.
    Centered,
    /// Dead-zoned and remapped readings.
    Normalized,
    /// Shaped velocity vector.
    Velocity,
    /// Centered readings followed by the velocity vector.
    AxesAndVelocity,
    /// Control-loop rate once per second.
    Frequency,
    /// Debounced keys.
    Buttons,
}

/// Wrapping-millisecond rate limiter.
#[derive(Debug, Clone)]
pub struct DebugThrottle {
    interval_ms: u32,
    last_ms: Option<u32>,
}

impl DebugThrottle {
    #[must_use]
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// True at most once per interval; the first call is always due.
    pub fn is_due(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            Some(last) if now_ms.wrapping_sub(last) < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}

fn format_named(names: &[&str], values: &[i32]) -> String {
    names
        .iter()
        .zip(values)
        .map(|(name, value)| format!("{}: {:4}", name, value))
        .collect::<Vec<_>>()
        .join("  ")
}

/// `"H0: 2100  H1: 2100  ..."`
#[must_use]
pub fn format_axes(values: &[i32; AXIS_COUNT]) -> String {
    format_named(&AXIS_NAMES, values)
}

/// `"TX:   12  TY:    0  ..."`
#[must_use]
pub fn format_velocity(velocity: &VelocityVector) -> String {
    format_named(&VELOCITY_NAMES, &velocity.to_array())
}

/// `"K0: 1  K1: 0"`
#[must_use]
pub fn format_keys(buttons: &ButtonState) -> String {
    buttons
        .flags()
        .iter()
        .enumerate()
        .map(|(i, &pressed)| format!("K{}: {}", i, u8::from(pressed)))
        .collect::<Vec<_>>()
        .join("  ")
}

/// TOML array literal that pastes straight into the `[calibration]` section.
///
/// ```
/// use spacemouse_core::telemetry::console::format_literal;
///
/// assert_eq!(format_literal(&[-480, 0, 512]), "[-480, 0, 512]");
/// ```
#[must_use]
pub fn format_literal(values: &[i32]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Counts control cycles and reports the rate once per second.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    iterations: u32,
    window_start_ms: Option<u32>,
}

impl FrequencyCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one cycle. Returns the cycle count of the window that just
    /// closed, once more than a second has passed since it opened.
    pub fn tick(&mut self, now_ms: u32) -> Option<u32> {
        self.iterations += 1;
        let start = *self.window_start_ms.get_or_insert(now_ms);
        if now_ms.wrapping_sub(start) > 1000 {
            let hz = self.iterations;
            self.iterations = 0;
            self.window_start_ms = Some(now_ms);
            Some(hz)
        } else {
            None
        }
    }
}
