//! # Sensor Module
//!
//! Acquisition side of the spacemouse: eight single-axis Hall-effect sensors
//! arranged in four opposing pairs around the knob, plus the optional keys.
//!
//! This module handles:
//! - The [`SensorSource`] seam the control loop reads one raw sample from per cycle
//! - Per-axis recursive noise filtering
//! - Replay and idle sources for running the core without hardware
//! - Key debouncing
//!
//! ## Sensor Layout
//!
//! Seen from above, USB connector at the back:
//!
//! ```text
//!      7   6              Y+
//!        |                .
//!   8    |    3           .
//!     ---+---        X-...Z+...X+
//!   9    |    2           .
//!        |                .
//!      0   1              Y-
//! ```
//!
//! Moving a magnet closer to its sensor decreases the reading.

pub mod filter;
pub mod keys;
pub mod source;

/// Number of Hall-effect sensor axes.
pub const AXIS_COUNT: usize = 8;

/// Display names of the axes, in sample order.
pub const AXIS_NAMES: [&str; AXIS_COUNT] = ["H0", "H1", "H2", "H3", "H6", "H7", "H8", "H9"];

/// Sample indices of the individual sensors.
pub mod axes {
    /// Front pair, left sensor
    pub const HES0: usize = 0;
    /// Front pair, right sensor
    pub const HES1: usize = 1;
    /// Right pair, front sensor
    pub const HES2: usize = 2;
    /// Right pair, back sensor
    pub const HES3: usize = 3;
    /// Back pair, right sensor
    pub const HES6: usize = 4;
    /// Back pair, left sensor
    pub const HES7: usize = 5;
    /// Left pair, back sensor
    pub const HES8: usize = 6;
    /// Left pair, front sensor
    pub const HES9: usize = 7;
}

/// One reading per sensor, in ADC counts `[0, adc_max]`.
pub type RawSample = [i32; AXIS_COUNT];

/// Supplies one raw sample per control cycle.
///
/// Implementations must return values within `[0, adc_max]`.
#[cfg_attr(test, mockall::automock)]
pub trait SensorSource {
    /// Reads all eight sensors once.
    fn read(&mut self) -> RawSample;
}
