//! # Spacemouse Core Library
//!
//! Motion resolution and report pacing for a six-degree-of-freedom input
//! device built from eight Hall-effect sensors.
//!
//! This library turns raw sensor readings into translation and rotation
//! velocities and paces them, together with button state, onto a
//! fixed-interval HID report channel.

pub mod config;
pub mod error;
pub mod hid;
pub mod motion;
pub mod pipeline;
pub mod sensor;
pub mod serial;
pub mod telemetry;
