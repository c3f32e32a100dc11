//! # Motion Module
//!
//! Turns filtered sensor samples into six degrees of freedom.
//!
//! This module handles:
//! - Zero-point and extent discovery (calibration)
//! - Dead-zone suppression and range remapping to `[-S, S]`
//! - The fixed kinematic transform from eight axes to six velocity components
//! - Sensitivity, response curves, gating, inversion and axis swaps
//! - Kill keys and exclusive translation/rotation arbitration

pub mod arbitration;
pub mod calibration;
pub mod kinematics;
pub mod normalize;
pub mod response;

use crate::sensor::AXIS_COUNT;

/// Default symmetric output scale S.
pub const DEFAULT_SCALE: i32 = 350;

/// Per-axis values after dead-zone suppression and remapping, each in `[-S, S]`.
pub type NormalizedAxes = [i32; AXIS_COUNT];

/// Display names of the velocity components, in [`VelocityVector::to_array`] order.
pub const VELOCITY_NAMES: [&str; 6] = ["TX", "TY", "TZ", "RX", "RY", "RZ"];

/// Six-component motion event produced once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VelocityVector {
    /// Translation along X.
    pub tx: i32,
    /// Translation along Y.
    pub ty: i32,
    /// Translation along Z.
    pub tz: i32,
    /// Rotation around X.
    pub rx: i32,
    /// Rotation around Y.
    pub ry: i32,
    /// Rotation around Z.
    pub rz: i32,
}

impl VelocityVector {
    /// All components zero.
    pub const ZERO: Self = Self {
        tx: 0,
        ty: 0,
        tz: 0,
        rx: 0,
        ry: 0,
        rz: 0,
    };

    /// Builds a vector from `[tx, ty, tz, rx, ry, rz]`.
    #[must_use]
    pub fn from_array(values: [i32; 6]) -> Self {
        let [tx, ty, tz, rx, ry, rz] = values;
        Self { tx, ty, tz, rx, ry, rz }
    }

    /// Returns `[tx, ty, tz, rx, ry, rz]`.
    #[must_use]
    pub fn to_array(&self) -> [i32; 6] {
        [self.tx, self.ty, self.tz, self.rx, self.ry, self.rz]
    }

    /// Returns `[tx, ty, tz]`.
    #[must_use]
    pub fn translation(&self) -> [i32; 3] {
        [self.tx, self.ty, self.tz]
    }

    /// Returns `[rx, ry, rz]`.
    #[must_use]
    pub fn rotation(&self) -> [i32; 3] {
        [self.rx, self.ry, self.rz]
    }

    /// True if every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Zeroes the three translation components.
    pub fn clear_translation(&mut self) {
        self.tx = 0;
        self.ty = 0;
        self.tz = 0;
    }

    /// Zeroes the three rotation components.
    pub fn clear_rotation(&mut self) {
        self.rx = 0;
        self.ry = 0;
        self.rz = 0;
    }

    /// Sum of absolute translation components.
    #[must_use]
    pub fn total_translation(&self) -> i32 {
        self.tx.abs() + self.ty.abs() + self.tz.abs()
    }

    /// Sum of absolute rotation components.
    #[must_use]
    pub fn total_rotation(&self) -> i32 {
        self.rx.abs() + self.ry.abs() + self.rz.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_roundtrip_order() {
        let v = VelocityVector::from_array([1, 2, 3, 4, 5, 6]);
        assert_eq!(v.tx, 1);
        assert_eq!(v.rz, 6);
        assert_eq!(v.translation(), [1, 2, 3]);
        assert_eq!(v.rotation(), [4, 5, 6]);
    }

    #[test]
    fn test_totals_use_magnitudes() {
        let v = VelocityVector::from_array([-1, 2, -3, 4, -5, 6]);
        assert_eq!(v.total_translation(), 6);
        assert_eq!(v.total_rotation(), 15);
    }

    #[test]
    fn test_clear_categories() {
        let mut v = VelocityVector::from_array([1, 1, 1, 1, 1, 1]);
        v.clear_translation();
        assert_eq!(v.translation(), [0, 0, 0]);
        assert_eq!(v.rotation(), [1, 1, 1]);
        v.clear_rotation();
        assert!(v.is_zero());
    }
}
