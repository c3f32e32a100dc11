//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file describes a device with the
//! reference calibration, no keys and the debug console switched off. The
//! `[keys]` section is optional; its absence means the device has no keys.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SpacemouseError};
use crate::hid::protocol::{ButtonMap, DEFAULT_BUTTON_REPORT_BYTES};
use crate::motion::arbitration::{Arbiter, ExclusiveTie, KillKeys};
use crate::motion::calibration::{AxisProfile, CalibrationProfile, RangeDiscovery, Zeroing};
use crate::motion::response::ResponseCurve;
use crate::motion::DEFAULT_SCALE;
use crate::sensor::filter::FilterParams;
use crate::sensor::AXIS_COUNT;
use crate::serial::SUPPORTED_BAUD_RATES;
use crate::telemetry::console::DebugMode;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub response: ResponseConfig,
    #[serde(default)]
    pub keys: Option<KeyConfig>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Serial link to the HID bridge
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Sensor acquisition and filtering
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_adc_max")]
    pub adc_max: i32,

    #[serde(default = "default_filter_measurement_error")]
    pub filter_measurement_error: f32,

    #[serde(default = "default_filter_estimation_error")]
    pub filter_estimation_error: f32,

    #[serde(default = "default_filter_process_noise")]
    pub filter_process_noise: f32,

    /// JSONL file of raw samples to play back instead of a knob at rest
    #[serde(default)]
    pub replay_file: Option<String>,
}

/// Calibration profile and calibration procedures
#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    #[serde(default = "default_zero")]
    pub zero: [i32; AXIS_COUNT],

    #[serde(default = "default_min")]
    pub min: [i32; AXIS_COUNT],

    #[serde(default = "default_max")]
    pub max: [i32; AXIS_COUNT],

    #[serde(default)]
    pub invert: [bool; AXIS_COUNT],

    #[serde(default = "default_dead_zone")]
    pub dead_zone: [i32; AXIS_COUNT],

    #[serde(default = "default_zeroing_iterations")]
    pub zeroing_iterations: u32,

    #[serde(default = "default_dead_zone_warning")]
    pub dead_zone_warning: i32,

    #[serde(default = "default_center_warning_min")]
    pub center_warning_min: i32,

    #[serde(default = "default_center_warning_max")]
    pub center_warning_max: i32,

    #[serde(default = "default_range_duration_ms")]
    pub range_duration_ms: u32,

    #[serde(default = "default_range_arm_delay_ms")]
    pub range_arm_delay_ms: u64,

    #[serde(default = "default_range_warning")]
    pub range_warning: i32,

    #[serde(default = "default_true")]
    pub zero_on_startup: bool,
}

/// Response shaping
#[derive(Debug, Deserialize, Clone)]
pub struct ResponseConfig {
    #[serde(default = "default_scale")]
    pub scale: i32,

    #[serde(default)]
    pub sensitivity: SensitivityConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub curve: ResponseCurve,

    #[serde(default = "default_true")]
    pub linear_positive_z: bool,

    #[serde(default)]
    pub invert: InvertConfig,

    #[serde(default)]
    pub switch_xy: bool,

    #[serde(default)]
    pub switch_yz: bool,

    #[serde(default)]
    pub exclusive: bool,

    #[serde(default)]
    pub exclusive_tie: ExclusiveTie,
}

/// Per-component divisors
#[derive(Debug, Deserialize, Clone)]
pub struct SensitivityConfig {
    #[serde(default = "default_sensitivity")]
    pub tx: f32,
    #[serde(default = "default_sensitivity")]
    pub ty: f32,
    #[serde(default = "default_sensitivity")]
    pub tz_pos: f32,
    #[serde(default = "default_sensitivity")]
    pub tz_neg: f32,
    #[serde(default = "default_sensitivity")]
    pub rx: f32,
    #[serde(default = "default_sensitivity")]
    pub ry: f32,
    #[serde(default = "default_sensitivity")]
    pub rz: f32,
}

/// Per-component gates
#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    #[serde(default)]
    pub tx: i32,
    #[serde(default)]
    pub ty: i32,
    #[serde(default)]
    pub tz_pos: i32,
    #[serde(default = "default_gate")]
    pub tz_neg: i32,
    #[serde(default = "default_gate")]
    pub rx: i32,
    #[serde(default = "default_gate")]
    pub ry: i32,
    #[serde(default = "default_gate")]
    pub rz: i32,
}

/// Per-component sign inversion
#[derive(Debug, Deserialize, Clone)]
pub struct InvertConfig {
    #[serde(default = "default_true")]
    pub tx: bool,
    #[serde(default = "default_true")]
    pub ty: bool,
    #[serde(default = "default_true")]
    pub tz: bool,
    #[serde(default = "default_true")]
    pub rx: bool,
    #[serde(default = "default_true")]
    pub ry: bool,
    #[serde(default = "default_true")]
    pub rz: bool,
}

/// Physical keys
#[derive(Debug, Deserialize, Clone)]
pub struct KeyConfig {
    #[serde(default = "default_key_count")]
    pub count: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,

    /// Bitmap position of each key reported to the host; keys past the end
    /// of this list are local only
    #[serde(default = "default_button_bits")]
    pub button_bits: Vec<u8>,

    #[serde(default = "default_report_bytes")]
    pub report_bytes: usize,

    #[serde(default)]
    pub kill_rotation: Option<usize>,

    #[serde(default)]
    pub kill_translation: Option<usize>,
}

/// Report pacing
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_interval_ms")]
    pub interval_ms: u32,

    #[serde(default = "default_zero_frames")]
    pub zero_frames: u8,
}

/// Debug console and cycle recording
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    #[serde(default)]
    pub mode: DebugMode,

    #[serde(default = "default_debug_interval_ms")]
    pub interval_ms: u32,

    #[serde(default)]
    pub record: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_true() -> bool { true }

fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115_200 }
fn default_timeout_ms() -> u64 { 100 }

fn default_adc_max() -> i32 { 4096 }
fn default_filter_measurement_error() -> f32 { 5.0 }
fn default_filter_estimation_error() -> f32 { 2.0 }
fn default_filter_process_noise() -> f32 { 0.01 }

fn default_zero() -> [i32; AXIS_COUNT] { [2100; AXIS_COUNT] }
fn default_min() -> [i32; AXIS_COUNT] { [-500; AXIS_COUNT] }
fn default_max() -> [i32; AXIS_COUNT] { [500; AXIS_COUNT] }
fn default_dead_zone() -> [i32; AXIS_COUNT] { [10; AXIS_COUNT] }
fn default_zeroing_iterations() -> u32 { 500 }
fn default_dead_zone_warning() -> i32 { 50 }
fn default_center_warning_min() -> i32 { 2100 - 128 }
fn default_center_warning_max() -> i32 { 2100 + 128 }
fn default_range_duration_ms() -> u32 { 15_000 }
fn default_range_arm_delay_ms() -> u64 { 3000 }
fn default_range_warning() -> i32 { 100 }

fn default_scale() -> i32 { DEFAULT_SCALE }
fn default_sensitivity() -> f32 { 1.0 }
fn default_gate() -> i32 { 20 }

fn default_key_count() -> usize { 2 }
fn default_debounce_ms() -> u32 { 200 }
fn default_button_bits() -> Vec<u8> { vec![0, 1] }
fn default_report_bytes() -> usize { DEFAULT_BUTTON_REPORT_BYTES }

fn default_report_interval_ms() -> u32 { 8 }
fn default_zero_frames() -> u8 { 3 }

fn default_debug_interval_ms() -> u32 { 100 }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            adc_max: default_adc_max(),
            filter_measurement_error: default_filter_measurement_error(),
            filter_estimation_error: default_filter_estimation_error(),
            filter_process_noise: default_filter_process_noise(),
            replay_file: None,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            zero: default_zero(),
            min: default_min(),
            max: default_max(),
            invert: [false; AXIS_COUNT],
            dead_zone: default_dead_zone(),
            zeroing_iterations: default_zeroing_iterations(),
            dead_zone_warning: default_dead_zone_warning(),
            center_warning_min: default_center_warning_min(),
            center_warning_max: default_center_warning_max(),
            range_duration_ms: default_range_duration_ms(),
            range_arm_delay_ms: default_range_arm_delay_ms(),
            range_warning: default_range_warning(),
            zero_on_startup: true,
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            sensitivity: SensitivityConfig::default(),
            gate: GateConfig::default(),
            curve: ResponseCurve::default(),
            linear_positive_z: true,
            invert: InvertConfig::default(),
            switch_xy: false,
            switch_yz: false,
            exclusive: false,
            exclusive_tie: ExclusiveTie::default(),
        }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        let s = default_sensitivity();
        Self { tx: s, ty: s, tz_pos: s, tz_neg: s, rx: s, ry: s, rz: s }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        let g = default_gate();
        Self { tx: 0, ty: 0, tz_pos: 0, tz_neg: g, rx: g, ry: g, rz: g }
    }
}

impl Default for InvertConfig {
    fn default() -> Self {
        Self { tx: true, ty: true, tz: true, rx: true, ry: true, rz: true }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            count: default_key_count(),
            debounce_ms: default_debounce_ms(),
            button_bits: default_button_bits(),
            report_bytes: default_report_bytes(),
            kill_rotation: None,
            kill_translation: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_report_interval_ms(),
            zero_frames: default_zero_frames(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            mode: DebugMode::default(),
            interval_ms: default_debug_interval_ms(),
            record: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl SensorConfig {
    /// Filter gains for the per-axis estimators.
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            measurement_error: self.filter_measurement_error,
            estimation_error: self.filter_estimation_error,
            process_noise: self.filter_process_noise,
        }
    }
}

impl CalibrationConfig {
    /// Calibration profile described by the per-axis arrays.
    pub fn profile(&self) -> CalibrationProfile {
        let mut axes = [AxisProfile::default(); AXIS_COUNT];
        for (i, axis) in axes.iter_mut().enumerate() {
            *axis = AxisProfile {
                zero: self.zero[i],
                min: self.min[i],
                max: self.max[i],
                invert: self.invert[i],
                dead_zone: self.dead_zone[i],
            };
        }
        CalibrationProfile::new(axes)
    }

    /// Zeroing procedure with the configured warning levels.
    pub fn zeroing(&self) -> Zeroing {
        Zeroing::new(
            self.zeroing_iterations,
            self.dead_zone_warning,
            self.center_warning_min,
            self.center_warning_max,
        )
    }

    /// Armed range discovery with the configured timing.
    pub fn range_discovery(&self, adc_max: i32) -> RangeDiscovery {
        RangeDiscovery::new(
            self.range_duration_ms,
            Duration::from_millis(self.range_arm_delay_ms),
            self.range_warning,
            adc_max,
        )
    }
}

impl ResponseConfig {
    /// Kill keys and exclusive mode. Without keys, kill keys are disabled.
    pub fn arbiter(&self, keys: Option<&KeyConfig>) -> Arbiter {
        let kill = keys
            .map(|k| KillKeys {
                rotation: k.kill_rotation,
                translation: k.kill_translation,
            })
            .unwrap_or_default();
        let exclusive = self.exclusive.then_some(self.exclusive_tie);
        Arbiter::new(exclusive, kill)
    }
}

impl KeyConfig {
    /// Key to bitmap assignment.
    pub fn button_map(&self) -> ButtonMap {
        ButtonMap::new(self.button_bits.clone(), self.report_bytes)
    }
}

fn invalid(message: impl std::fmt::Display) -> SpacemouseError {
    SpacemouseError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails, including a calibration profile that would make
    ///   the range remap singular
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use spacemouse_core::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Serial link
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Sensors
        if self.sensors.adc_max <= 0 {
            return Err(invalid("adc_max must be greater than 0"));
        }

        for (name, value) in [
            ("filter_measurement_error", self.sensors.filter_measurement_error),
            ("filter_estimation_error", self.sensors.filter_estimation_error),
        ] {
            if value <= 0.0 {
                return Err(invalid(format!("{} must be greater than 0", name)));
            }
        }

        if self.sensors.filter_process_noise < 0.0 {
            return Err(invalid("filter_process_noise cannot be negative"));
        }

        // Calibration
        self.calibration.profile().validate(self.sensors.adc_max)?;

        if self.calibration.zeroing_iterations == 0 {
            return Err(invalid("zeroing_iterations must be greater than 0"));
        }

        if self.calibration.center_warning_min > self.calibration.center_warning_max {
            return Err(invalid("center_warning_min must not exceed center_warning_max"));
        }

        if self.calibration.range_duration_ms == 0 {
            return Err(invalid("range_duration_ms must be greater than 0"));
        }

        // Response shaping
        if self.response.scale <= 0 || self.response.scale > i32::from(i16::MAX) {
            return Err(invalid("scale must be between 1 and 32767"));
        }

        let s = &self.response.sensitivity;
        for (name, value) in [
            ("tx", s.tx),
            ("ty", s.ty),
            ("tz_pos", s.tz_pos),
            ("tz_neg", s.tz_neg),
            ("rx", s.rx),
            ("ry", s.ry),
            ("rz", s.rz),
        ] {
            if !(value > 0.0) {
                return Err(invalid(format!("sensitivity.{} must be greater than 0", name)));
            }
        }

        let g = &self.response.gate;
        for (name, value) in [
            ("tx", g.tx),
            ("ty", g.ty),
            ("tz_pos", g.tz_pos),
            ("tz_neg", g.tz_neg),
            ("rx", g.rx),
            ("ry", g.ry),
            ("rz", g.rz),
        ] {
            if value < 0 {
                return Err(invalid(format!("gate.{} cannot be negative", name)));
            }
        }

        // Keys
        if let Some(keys) = &self.keys {
            if keys.button_bits.len() > keys.count {
                return Err(invalid("button_bits cannot list more keys than count"));
            }

            if keys.report_bytes == 0 {
                return Err(invalid("report_bytes must be greater than 0"));
            }

            for &bit in &keys.button_bits {
                if usize::from(bit) >= keys.report_bytes * 8 {
                    return Err(invalid(format!(
                        "button bit {} does not fit in {} report bytes",
                        bit, keys.report_bytes
                    )));
                }
            }

            for (name, key) in [
                ("kill_rotation", keys.kill_rotation),
                ("kill_translation", keys.kill_translation),
            ] {
                if let Some(index) = key {
                    if index >= keys.count {
                        return Err(invalid(format!(
                            "{} key {} is out of bounds (must be 0-{})",
                            name,
                            index,
                            keys.count.saturating_sub(1)
                        )));
                    }
                }
            }
        }

        // Report pacing
        if self.report.interval_ms == 0 || self.report.interval_ms > 1000 {
            return Err(invalid("report interval_ms must be between 1 and 1000"));
        }

        if self.report.zero_frames == 0 {
            return Err(invalid("zero_frames must be greater than 0"));
        }

        // Debug
        if self.debug.interval_ms == 0 {
            return Err(invalid("debug interval_ms must be greater than 0"));
        }

        if self.debug.record && self.debug.log_dir.is_empty() {
            return Err(invalid("debug log_dir cannot be empty when recording"));
        }

        if self.debug.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.debug.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config {
            keys: Some(KeyConfig::default()),
            ..Config::default()
        }
    }

    fn load_str(toml_content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    // ==================== Loading Tests ====================

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let config = load_str("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.sensors.adc_max, 4096);
        assert_eq!(config.calibration.zero, [2100; AXIS_COUNT]);
        assert_eq!(config.calibration.dead_zone, [10; AXIS_COUNT]);
        assert_eq!(config.calibration.center_warning_min, 1972);
        assert_eq!(config.calibration.center_warning_max, 2228);
        assert_eq!(config.response.scale, 350);
        assert_eq!(config.response.curve, ResponseCurve::SquaredTangent);
        assert_eq!(config.response.gate.rx, 20);
        assert_eq!(config.response.gate.tx, 0);
        assert!(config.response.invert.tz);
        assert!(config.response.linear_positive_z);
        assert!(config.keys.is_none(), "No [keys] section means no keys");
        assert_eq!(config.report.interval_ms, 8);
        assert_eq!(config.report.zero_frames, 3);
        assert_eq!(config.debug.mode, DebugMode::Off);
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"
baud_rate = 921600

[sensors]
replay_file = "recordings/sweep.jsonl"

[calibration]
zero = [1400, 1410, 1390, 1400, 1405, 1395, 1400, 1402]
min = [-500, -527, -447, -462, -583, -436, -490, -531]
max = [546, 485, 528, 565, 481, 549, 488, 582]
zero_on_startup = false

[response]
curve = "tangent"
exclusive = true
exclusive_tie = "rotation"

[response.sensitivity]
tz_neg = 2.0

[response.invert]
rz = false

[keys]
count = 3
button_bits = [12, 26]
report_bytes = 4
kill_rotation = 2

[report]
interval_ms = 10

[debug]
mode = "velocity"
"#;

        let config = load_str(toml_content).unwrap();
        assert_eq!(config.serial.baud_rate, 921_600);
        assert_eq!(config.sensors.replay_file.as_deref(), Some("recordings/sweep.jsonl"));
        assert_eq!(config.calibration.min[4], -583);
        assert!(!config.calibration.zero_on_startup);
        assert_eq!(config.response.curve, ResponseCurve::Tangent);
        assert_eq!(config.response.exclusive_tie, ExclusiveTie::Rotation);
        assert_eq!(config.response.sensitivity.tz_neg, 2.0);
        assert_eq!(config.response.sensitivity.tx, 1.0);
        assert!(!config.response.invert.rz);
        assert!(config.response.invert.rx);
        let keys = config.keys.as_ref().unwrap();
        assert_eq!(keys.kill_rotation, Some(2));
        assert_eq!(keys.debounce_ms, 200);
        assert_eq!(config.report.interval_ms, 10);
        assert_eq!(config.debug.mode, DebugMode::Velocity);
    }

    #[test]
    fn test_load_rejects_unknown_curve() {
        let result = load_str("[response]\ncurve = \"quartic\"\n");
        assert!(matches!(result, Err(SpacemouseError::Config(_))));
    }

    #[test]
    fn test_load_rejects_short_axis_array() {
        let result = load_str("[calibration]\nzero = [2100, 2100]\n");
        assert!(matches!(result, Err(SpacemouseError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/spacemouse.toml");
        assert!(matches!(result, Err(SpacemouseError::Io(_))));
    }

    #[test]
    fn test_load_rejects_singular_profile() {
        let result = load_str("[calibration]\ndead_zone = [10, 10, 10, 600, 10, 10, 10, 10]\n");
        assert!(matches!(result, Err(SpacemouseError::Profile { axis: 3, .. })));
    }

    // ==================== Serial Validation Tests ====================

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_baud_rate() {
        let mut config = create_valid_config();
        config.serial.baud_rate = 420_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_ms_bounds() {
        let mut config = create_valid_config();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 10001;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 10000;
        assert!(config.validate().is_ok());
    }

    // ==================== Sensor Validation Tests ====================

    #[test]
    fn test_adc_max_zero() {
        let mut config = create_valid_config();
        config.sensors.adc_max = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filter_errors_must_be_positive() {
        let mut config = create_valid_config();
        config.sensors.filter_measurement_error = 0.0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.sensors.filter_process_noise = -0.1;
        assert!(config.validate().is_err());
    }

    // ==================== Calibration Validation Tests ====================

    #[test]
    fn test_dead_zone_reaching_extent() {
        let mut config = create_valid_config();
        config.calibration.dead_zone[0] = 500;
        assert!(config.validate().is_err(), "dead_zone == max makes the remap singular");
    }

    #[test]
    fn test_zero_outside_adc_range() {
        let mut config = create_valid_config();
        config.calibration.zero[7] = 5000;
        assert!(matches!(
            config.validate(),
            Err(SpacemouseError::Profile { axis: 7, .. })
        ));
    }

    #[test]
    fn test_zeroing_iterations_zero() {
        let mut config = create_valid_config();
        config.calibration.zeroing_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_center_warning_band_inverted() {
        let mut config = create_valid_config();
        config.calibration.center_warning_min = 2000;
        config.calibration.center_warning_max = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_profile_from_arrays() {
        let mut config = create_valid_config();
        config.calibration.invert[2] = true;
        config.calibration.max[5] = 612;
        let profile = config.calibration.profile();
        assert!(profile.axes[2].invert);
        assert!(!profile.axes[1].invert);
        assert_eq!(profile.axes[5].max, 612);
        assert_eq!(profile.axes[0], AxisProfile::default());
    }

    // ==================== Response Validation Tests ====================

    #[test]
    fn test_scale_bounds() {
        let mut config = create_valid_config();
        config.response.scale = 0;
        assert!(config.validate().is_err());
        config.response.scale = 40_000;
        assert!(config.validate().is_err(), "Scale must fit the i16 report fields");
    }

    #[test]
    fn test_sensitivity_zero() {
        let mut config = create_valid_config();
        config.response.sensitivity.ry = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensitivity_nan() {
        let mut config = create_valid_config();
        config.response.sensitivity.tx = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_gate() {
        let mut config = create_valid_config();
        config.response.gate.tz_neg = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_arbiter_without_keys_ignores_kill_keys() {
        let mut config = create_valid_config();
        config.response.exclusive = true;
        let expected = Arbiter::new(Some(ExclusiveTie::Translation), KillKeys::default());
        assert_eq!(config.response.arbiter(None), expected);
    }

    // ==================== Key Validation Tests ====================

    #[test]
    fn test_kill_key_out_of_range() {
        let mut config = create_valid_config();
        config.keys.as_mut().unwrap().kill_translation = Some(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_button_bit_beyond_report() {
        let mut config = create_valid_config();
        config.keys.as_mut().unwrap().button_bits = vec![0, 16];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_more_button_bits_than_keys() {
        let mut config = create_valid_config();
        config.keys.as_mut().unwrap().button_bits = vec![0, 1, 2];
        assert!(config.validate().is_err());
    }

    // ==================== Report and Debug Validation Tests ====================

    #[test]
    fn test_report_interval_bounds() {
        let mut config = create_valid_config();
        config.report.interval_ms = 0;
        assert!(config.validate().is_err());
        config.report.interval_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_frames_zero() {
        let mut config = create_valid_config();
        config.report.zero_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_recording() {
        let mut config = create_valid_config();
        config.debug.log_dir = String::new();
        assert!(config.validate().is_ok());
        config.debug.record = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = create_valid_config();
        config.debug.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = create_valid_config();
        config.debug.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }
}
