//! # Kinematic Transform
//!
//! Fixed linear map from the eight normalized sensor axes to six velocity
//! components. The pairing encodes the physical sensor layout and must not
//! be changed.
//!
//! ## Pairing Table
//!
//! | Component | Combination | Divisor |
//! |-----------|-------------|---------|
//! | TX | `H1 - H0 + H6 - H7` | 2 |
//! | TY | `H2 - H3 + H9 - H8` | 2 |
//! | TZ | `H0 + H1 + H2 + H3 + H6 + H7 + H8 + H9` | 4 |
//! | RX | `H0 + H1 - H6 - H7` | 2 |
//! | RY | `H8 + H9 - H2 - H3` | 2 |
//! | RZ | `H0 + H2 + H6 + H8 - H1 - H3 - H7 - H9` | 4 |
//!
//! Division truncates toward zero.

use super::{NormalizedAxes, VelocityVector};
use crate::sensor::axes::{HES0, HES1, HES2, HES3, HES6, HES7, HES8, HES9};

/// Computes raw velocity components from normalized axes.
///
/// # Examples
///
/// ```
/// use spacemouse_core::motion::kinematics::transform;
///
/// // Knob pushed straight down: every magnet moves closer
/// let v = transform(&[-100; 8]);
/// assert_eq!(v.tz, -200);
/// assert_eq!(v.tx, 0);
/// ```
#[must_use]
pub fn transform(n: &NormalizedAxes) -> VelocityVector {
    VelocityVector {
        tx: (n[HES1] - n[HES0] + n[HES6] - n[HES7]) / 2,
        ty: (n[HES2] - n[HES3] + n[HES9] - n[HES8]) / 2,
        tz: (n[HES0] + n[HES1] + n[HES2] + n[HES3] + n[HES6] + n[HES7] + n[HES8] + n[HES9]) / 4,
        rx: (n[HES0] + n[HES1] - n[HES6] - n[HES7]) / 2,
        ry: (n[HES8] + n[HES9] - n[HES2] - n[HES3]) / 2,
        rz: (n[HES0] + n[HES2] + n[HES6] + n[HES8] - n[HES1] - n[HES3] - n[HES7] - n[HES9]) / 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::AXIS_COUNT;

    fn stimulus(pairs: &[(usize, i32)]) -> NormalizedAxes {
        let mut n = [0; AXIS_COUNT];
        for &(axis, value) in pairs {
            n[axis] = value;
        }
        n
    }

    #[test]
    fn test_idle_is_zero() {
        assert!(transform(&[0; AXIS_COUNT]).is_zero());
    }

    #[test]
    fn test_pure_translation_x() {
        let n = stimulus(&[(HES0, -100), (HES1, 100), (HES6, 100), (HES7, -100)]);
        assert_eq!(transform(&n), VelocityVector { tx: 200, ..VelocityVector::ZERO });
    }

    #[test]
    fn test_pure_translation_y() {
        let n = stimulus(&[(HES2, 100), (HES3, -100), (HES8, -100), (HES9, 100)]);
        assert_eq!(transform(&n), VelocityVector { ty: 200, ..VelocityVector::ZERO });
    }

    #[test]
    fn test_pure_translation_z() {
        let v = transform(&[80; AXIS_COUNT]);
        assert_eq!(v, VelocityVector { tz: 160, ..VelocityVector::ZERO });
    }

    #[test]
    fn test_pure_rotation_x() {
        // Tilt forward: front pair further away, back pair closer
        let n = stimulus(&[(HES0, 100), (HES1, 100), (HES6, -100), (HES7, -100)]);
        assert_eq!(transform(&n), VelocityVector { rx: 200, ..VelocityVector::ZERO });
    }

    #[test]
    fn test_pure_rotation_y() {
        let n = stimulus(&[(HES2, -100), (HES3, -100), (HES8, 100), (HES9, 100)]);
        assert_eq!(transform(&n), VelocityVector { ry: 200, ..VelocityVector::ZERO });
    }

    #[test]
    fn test_pure_rotation_z() {
        // Clockwise twist: alternating sensors within each pair
        let n = [100, -100, 100, -100, 100, -100, 100, -100];
        assert_eq!(transform(&n), VelocityVector { rz: 200, ..VelocityVector::ZERO });
    }

    #[test]
    fn test_single_axis_contributions() {
        // H0 alone enters TX negatively, TZ, RX and RZ positively
        let v = transform(&stimulus(&[(HES0, 100)]));
        assert_eq!(v, VelocityVector::from_array([-50, 0, 25, 50, 0, 25]));
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        let v = transform(&stimulus(&[(HES1, 3)]));
        assert_eq!(v.tx, 1);
        let v = transform(&stimulus(&[(HES1, -3)]));
        assert_eq!(v.tx, -1);
        assert_eq!(v.tz, 0);
    }

    #[test]
    fn test_is_linear() {
        let a = [10, -20, 30, -40, 50, -60, 70, -80];
        let b = [-5, 15, 25, 35, -45, 55, 65, 75];
        let mut sum = [0; AXIS_COUNT];
        for i in 0..AXIS_COUNT {
            sum[i] = 4 * (a[i] + b[i]);
        }
        let mut a4 = a;
        let mut b4 = b;
        for i in 0..AXIS_COUNT {
            a4[i] *= 4;
            b4[i] *= 4;
        }
        // Multiples of 4 avoid truncation so superposition holds exactly
        let lhs = transform(&sum).to_array();
        let ta = transform(&a4).to_array();
        let tb = transform(&b4).to_array();
        for i in 0..6 {
            assert_eq!(lhs[i], ta[i] + tb[i], "Component {} not additive", i);
        }
    }
}
