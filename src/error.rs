//! # Error Types
//!
//! Custom error types for the spacemouse core using `thiserror`.
//!
//! Calibration anomalies are not errors: they are reported as
//! [`CalibrationWarning`](crate::motion::calibration::CalibrationWarning) values.

use thiserror::Error;

/// Main error type for the spacemouse core
#[derive(Debug, Error)]
pub enum SpacemouseError {
    /// Configuration errors (parse failures and validation failures)
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Calibration profile that would make the range remap singular
    #[error("Invalid calibration profile for axis {axis}: {reason}")]
    Profile { axis: usize, reason: String },

    /// Serial transport errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Malformed replay file
    #[error("Replay error: {0}")]
    Replay(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the spacemouse core
pub type Result<T> = std::result::Result<T, SpacemouseError>;
