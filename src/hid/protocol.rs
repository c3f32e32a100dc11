//! # HID Report Definitions
//!
//! Byte layouts of the reports exchanged with the host.
//!
//! | Id | Direction | Payload |
//! |----|-----------|---------|
//! | 1 | device → host | Tx, Ty, Tz as `i16` little-endian |
//! | 2 | device → host | Rx, Ry, Rz as `i16` little-endian |
//! | 3 | device → host | button bitmap, `report_bytes` long |
//! | 4 | host → device | LED state, 1 byte, nonzero = on |

use bytes::{BufMut, Bytes, BytesMut};

use crate::motion::VelocityVector;
use crate::sensor::keys::ButtonState;

/// Translation report id
pub const REPORT_ID_TRANSLATION: u8 = 1;

/// Rotation report id
pub const REPORT_ID_ROTATION: u8 = 2;

/// Button report id
pub const REPORT_ID_BUTTONS: u8 = 3;

/// LED output report id
pub const REPORT_ID_LED: u8 = 4;

/// Payload size of the translation and rotation reports (3 × i16)
pub const AXIS_REPORT_PAYLOAD_SIZE: usize = 6;

/// Payload size of the LED output report
pub const LED_REPORT_PAYLOAD_SIZE: usize = 1;

/// Default button bitmap length in bytes
pub const DEFAULT_BUTTON_REPORT_BYTES: usize = 2;

/// One outbound report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFrame {
    /// Tx, Ty, Tz
    Translation([i16; 3]),
    /// Rx, Ry, Rz
    Rotation([i16; 3]),
    /// Packed button bitmap
    Buttons(Vec<u8>),
}

impl ReportFrame {
    /// Translation frame from a velocity vector, saturated to `i16`.
    #[must_use]
    pub fn translation(v: &VelocityVector) -> Self {
        Self::Translation(saturate(v.translation()))
    }

    /// Rotation frame from a velocity vector, saturated to `i16`.
    #[must_use]
    pub fn rotation(v: &VelocityVector) -> Self {
        Self::Rotation(saturate(v.rotation()))
    }

    /// HID report id of this frame.
    #[must_use]
    pub fn report_id(&self) -> u8 {
        match self {
            Self::Translation(_) => REPORT_ID_TRANSLATION,
            Self::Rotation(_) => REPORT_ID_ROTATION,
            Self::Buttons(_) => REPORT_ID_BUTTONS,
        }
    }

    /// Report payload without the id.
    #[must_use]
    pub fn payload(&self) -> Bytes {
        match self {
            Self::Translation(values) | Self::Rotation(values) => {
                let mut buf = BytesMut::with_capacity(AXIS_REPORT_PAYLOAD_SIZE);
                for &value in values {
                    buf.put_i16_le(value);
                }
                buf.freeze()
            }
            Self::Buttons(bitmap) => Bytes::copy_from_slice(bitmap),
        }
    }

    /// Complete wire frame: report id followed by the payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use spacemouse_core::hid::protocol::ReportFrame;
    ///
    /// let frame = ReportFrame::Translation([1, -1, 256]);
    /// assert_eq!(&frame.encode()[..], &[1, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x01]);
    /// ```
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let payload = self.payload();
        let mut buf = BytesMut::with_capacity(1 + payload.len());
        buf.put_u8(self.report_id());
        buf.put_slice(&payload);
        buf.freeze()
    }
}

fn saturate(values: [i32; 3]) -> [i16; 3] {
    values.map(|v| v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)
}

/// Assignment of debounced keys to bits of the button report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    bits: Vec<u8>,
    report_bytes: usize,
}

impl ButtonMap {
    /// `bits[i]` is the bitmap position of key `i`.
    #[must_use]
    pub fn new(bits: Vec<u8>, report_bytes: usize) -> Self {
        Self { bits, report_bytes }
    }

    /// Bitmap length in bytes.
    #[must_use]
    pub fn report_bytes(&self) -> usize {
        self.report_bytes
    }

    /// Packs the pressed keys into a bitmap.
    ///
    /// Bits accumulate, so two keys mapped to the same byte both show up.
    /// Keys without a bit assignment and bits past the bitmap are ignored.
    #[must_use]
    pub fn pack(&self, buttons: &ButtonState) -> Vec<u8> {
        let mut bitmap = vec![0u8; self.report_bytes];
        for (key, &bit) in self.bits.iter().enumerate() {
            if !buttons.is_pressed(key) {
                continue;
            }
            if let Some(byte) = bitmap.get_mut(usize::from(bit / 8)) {
                *byte |= 1 << (bit % 8);
            }
        }
        bitmap
    }
}

/// Decodes an inbound LED output report.
///
/// Returns the requested LED state, or `None` for other report ids or an
/// empty payload.
#[must_use]
pub fn decode_led_report(report_id: u8, payload: &[u8]) -> Option<bool> {
    if report_id != REPORT_ID_LED {
        return None;
    }
    payload.first().map(|&state| state != 0)
}
