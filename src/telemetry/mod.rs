//! # Telemetry Module
//!
//! Observability for bench tuning.
//!
//! This module handles:
//! - Throttled human-readable dumps of a selected pipeline stage
//! - Configuration literals for calibration results
//! - Control-loop frequency reporting
//! - Recording cycles to rotating JSONL files (max N records per file, last M files kept)

pub mod console;
pub mod logger;

/// `tracing` target of stage dumps, so they can be filtered separately.
pub const DEBUG_TARGET: &str = "spacemouse::debug";
