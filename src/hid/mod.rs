//! # HID Module
//!
//! Host-facing side of the spacemouse.
//!
//! This module handles:
//! - Report ids and byte layouts for translation, rotation and button reports
//! - Packing debounced keys into the button bitmap
//! - Decoding the inbound LED output report
//! - Pacing reports onto the fixed-interval channel

pub mod protocol;
pub mod scheduler;

pub use protocol::{ButtonMap, ReportFrame};
pub use scheduler::{ReportScheduler, SchedulerState};
