//! # Serial Transport Module
//!
//! Carries HID reports to the host over a serial link to a USB HID bridge.
//!
//! This module handles:
//! - Opening the serial device (8N1, no flow control)
//! - Writing `[report_id, payload...]` frames
//! - Fire-and-forget delivery: a failed send is reported once and never
//!   retried, the scheduler's next pacing tick sends fresh data anyway
//! - Receiving LED output reports forwarded by the bridge

pub mod port_trait;

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SpacemouseError};
use crate::hid::protocol::{
    decode_led_report, ReportFrame, LED_REPORT_PAYLOAD_SIZE, REPORT_ID_LED,
};
use port_trait::{SerialPortIO, TokioSerialPort};

/// Default baud rate of the HID bridge
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Baud rates the HID bridge firmware accepts
pub const SUPPORTED_BAUD_RATES: [u32; 4] = [115_200, 230_400, 460_800, 921_600];

/// Device paths tried when the port is left at its default
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC bridges
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Read chunk size for inbound reports
const READ_CHUNK_SIZE: usize = 64;

/// Paths to try for a configured port.
///
/// The default port falls back to the other well-known device paths; any
/// other port is tried alone.
#[must_use]
pub fn candidate_paths(configured: &str) -> Vec<&str> {
    if DEFAULT_DEVICE_PATHS.iter().any(|p| *p == configured) {
        let mut paths = vec![configured];
        paths.extend(DEFAULT_DEVICE_PATHS.iter().copied().filter(|p| *p != configured));
        paths
    } else {
        vec![configured]
    }
}

/// Report channel to the host.
pub struct HidLink<P: SerialPortIO = TokioSerialPort> {
    port: P,
    device_path: String,
    frames_sent: u64,
    inbound: BytesMut,
}

impl<P: SerialPortIO> std::fmt::Debug for HidLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidLink")
            .field("device_path", &self.device_path)
            .field("frames_sent", &self.frames_sent)
            .finish_non_exhaustive()
    }
}

impl HidLink<TokioSerialPort> {
    /// Opens the first device in `paths` that accepts the settings.
    ///
    /// # Errors
    ///
    /// Returns [`SpacemouseError::SerialPortNotFound`] listing every path
    /// tried if none could be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use spacemouse_core::serial::{HidLink, DEFAULT_BAUD_RATE};
    ///
    /// let link = HidLink::open_with_paths(&["/dev/ttyACM0"], DEFAULT_BAUD_RATE, Duration::from_millis(100))?;
    /// println!("Connected to: {}", link.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(stream) => {
                    info!("Opened HID bridge at {} ({} baud)", path, baud_rate);
                    return Ok(Self::with_port(TokioSerialPort::new(stream), path));
                }
                Err(e) => warn!("Failed to open {}: {}", path, e),
            }
        }

        Err(SpacemouseError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open_native_async()
            .map_err(|e| SpacemouseError::Serial(format!("Failed to open {}: {}", path, e)))
    }
}

impl<P: SerialPortIO> HidLink<P> {
    /// Wraps an already opened port.
    pub fn with_port(port: P, device_path: &str) -> Self {
        Self {
            port,
            device_path: device_path.to_string(),
            frames_sent: 0,
            inbound: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Writes one report frame and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`SpacemouseError::Serial`] if the write or flush fails. The
    /// frame is dropped; callers log and carry on.
    pub async fn send_report(&mut self, frame: &ReportFrame) -> Result<()> {
        let bytes = frame.encode();

        self.port
            .write_all(&bytes)
            .await
            .map_err(|e| SpacemouseError::Serial(format!("Failed to write report: {}", e)))?;
        self.port
            .flush()
            .await
            .map_err(|e| SpacemouseError::Serial(format!("Failed to flush serial port: {}", e)))?;

        self.frames_sent += 1;
        debug!(report_id = frame.report_id(), len = bytes.len(), "Sent report");
        Ok(())
    }

    /// Waits for the next LED output report and returns the requested state.
    ///
    /// Bytes that do not start an LED report are skipped. Cancel safe: a
    /// partially received report stays buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`SpacemouseError::Serial`] if the read fails or the port
    /// was closed.
    pub async fn receive_led(&mut self) -> Result<bool> {
        loop {
            if let Some(on) = self.take_led_report() {
                return Ok(on);
            }
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self
                .port
                .read(&mut chunk)
                .await
                .map_err(|e| SpacemouseError::Serial(format!("Failed to read report: {}", e)))?;
            if n == 0 {
                return Err(SpacemouseError::Serial("Serial port closed".to_string()));
            }
            self.inbound.extend_from_slice(&chunk[..n]);
        }
    }

    fn take_led_report(&mut self) -> Option<bool> {
        while let Some(&id) = self.inbound.first() {
            if id != REPORT_ID_LED {
                trace!(byte = id, "Skipping inbound byte");
                self.inbound.advance(1);
                continue;
            }
            if self.inbound.len() < 1 + LED_REPORT_PAYLOAD_SIZE {
                return None;
            }
            let report = self.inbound.split_to(1 + LED_REPORT_PAYLOAD_SIZE);
            return decode_led_report(report[0], &report[1..]);
        }
        None
    }

    /// Path of the opened device.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Number of frames delivered so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}
