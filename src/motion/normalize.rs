//! # Normalizer
//!
//! Maps filtered raw readings onto the symmetric output scale `[-S, S]`.
//!
//! Per axis:
//!
//! 1. `centered = raw - zero`
//! 2. negate if the axis is inverted
//! 3. `|centered| < dead_zone` → 0
//! 4. remap `[dead_zone, max]` → `[0, S]` or `[min, -dead_zone]` → `[-S, 0]`
//!
//! Readings beyond the calibrated extents are clamped to `±S`.
//!
//! ## Usage
//!
//! ```
//! use spacemouse_core::motion::calibration::CalibrationProfile;
//! use spacemouse_core::motion::normalize::Normalizer;
//!
//! let normalizer = Normalizer::new(CalibrationProfile::default(), 350, 4096)?;
//! assert_eq!(normalizer.normalize(&[2100; 8]), [0; 8]);
//! # Ok::<(), spacemouse_core::error::SpacemouseError>(())
//! ```

use super::calibration::{AxisProfile, CalibrationProfile};
use super::NormalizedAxes;
use crate::error::Result;
use crate::sensor::{RawSample, AXIS_COUNT};

/// Applies a validated calibration profile.
#[derive(Debug, Clone)]
pub struct Normalizer {
    profile: CalibrationProfile,
    scale: i32,
}

impl Normalizer {
    /// Creates a normalizer after checking the profile preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SpacemouseError::Profile`] if any axis would
    /// make the remap singular.
    pub fn new(profile: CalibrationProfile, scale: i32, adc_max: i32) -> Result<Self> {
        profile.validate(adc_max)?;
        Ok(Self { profile, scale })
    }

    /// The profile in use.
    #[must_use]
    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Output scale S.
    #[must_use]
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Replaces the zero points, e.g. after zeroing.
    pub fn set_zero(&mut self, zero: &RawSample) {
        self.profile = self.profile.with_zero(zero);
    }

    /// Replaces the whole profile, e.g. with freshly discovered extents.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SpacemouseError::Profile`] and keeps the
    /// current profile if the new one fails validation.
    pub fn set_profile(&mut self, profile: CalibrationProfile, adc_max: i32) -> Result<()> {
        profile.validate(adc_max)?;
        self.profile = profile;
        Ok(())
    }

    /// Subtracts zero points and applies inversion.
    #[must_use]
    pub fn center(&self, raw: &RawSample) -> [i32; AXIS_COUNT] {
        let mut centered = [0; AXIS_COUNT];
        for (i, axis) in self.profile.axes.iter().enumerate() {
            let value = raw[i] - axis.zero;
            centered[i] = if axis.invert { -value } else { value };
        }
        centered
    }

    /// Applies dead zone and range remap to already centered values.
    #[must_use]
    pub fn normalize_centered(&self, centered: &[i32; AXIS_COUNT]) -> NormalizedAxes {
        let mut out = [0; AXIS_COUNT];
        for (i, axis) in self.profile.axes.iter().enumerate() {
            out[i] = remap_axis(centered[i], axis, self.scale);
        }
        out
    }

    /// Full normalization of a filtered raw sample.
    #[must_use]
    pub fn normalize(&self, raw: &RawSample) -> NormalizedAxes {
        self.normalize_centered(&self.center(raw))
    }
}

fn remap_axis(centered: i32, axis: &AxisProfile, scale: i32) -> i32 {
    let dz = axis.dead_zone;
    if centered > -dz && centered < dz {
        return 0;
    }
    let mapped = if centered < 0 {
        map_range(centered, axis.min, -dz, -scale, 0)
    } else {
        map_range(centered, dz, axis.max, 0, scale)
    };
    mapped.clamp(-scale, scale)
}

/// Linear integer remap with truncating division.
///
/// `in_min != in_max` is a caller precondition.
fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let numerator = i64::from(x - in_min) * i64::from(out_max - out_min);
    let value = numerator / i64::from(in_max - in_min) + i64::from(out_min);
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpacemouseError;

    fn profile_with(zero: i32, min: i32, max: i32, dead_zone: i32) -> CalibrationProfile {
        CalibrationProfile::new(
            [AxisProfile {
                zero,
                min,
                max,
                invert: false,
                dead_zone,
            }; AXIS_COUNT],
        )
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(profile_with(2100, -500, 500, 10), 350, 4096).unwrap()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_singular_profile() {
        let result = Normalizer::new(profile_with(2100, -500, 10, 10), 350, 4096);
        assert!(matches!(result, Err(SpacemouseError::Profile { axis: 0, .. })));
    }

    // ==================== Dead Zone Tests ====================

    #[test]
    fn test_at_rest_is_zero() {
        assert_eq!(normalizer().normalize(&[2100; AXIS_COUNT]), [0; AXIS_COUNT]);
    }

    #[test]
    fn test_inside_dead_zone_is_zero() {
        let n = normalizer();
        for offset in -9..=9 {
            let out = n.normalize(&[2100 + offset; AXIS_COUNT]);
            assert_eq!(out, [0; AXIS_COUNT], "Offset {} should be suppressed", offset);
        }
    }

    #[test]
    fn test_dead_zone_boundary_maps_to_zero() {
        let n = normalizer();
        assert_eq!(n.normalize(&[2110; AXIS_COUNT])[0], 0);
        assert_eq!(n.normalize(&[2090; AXIS_COUNT])[0], 0);
    }

    // ==================== Remap Tests ====================

    #[test]
    fn test_full_extent_maps_to_scale() {
        let n = normalizer();
        assert_eq!(n.normalize(&[2600; AXIS_COUNT])[0], 350);
        assert_eq!(n.normalize(&[1600; AXIS_COUNT])[0], -350);
    }

    #[test]
    fn test_midpoint_remap() {
        // (255 - 10) * 350 / 490 = 175
        let n = normalizer();
        assert_eq!(n.normalize(&[2355; AXIS_COUNT])[0], 175);
        assert_eq!(n.normalize(&[1845; AXIS_COUNT])[0], -175);
    }

    #[test]
    fn test_beyond_extent_is_clamped() {
        let n = normalizer();
        assert_eq!(n.normalize(&[4095; AXIS_COUNT])[0], 350);
        assert_eq!(n.normalize(&[0; AXIS_COUNT])[0], -350);
    }

    #[test]
    fn test_output_bounded_and_monotonic_over_adc_range() {
        let n = Normalizer::new(profile_with(2000, -300, 700, 25), 350, 4096).unwrap();
        let mut previous = i32::MIN;
        for raw in 0..=4096 {
            let value = n.normalize(&[raw; AXIS_COUNT])[0];
            assert!((-350..=350).contains(&value), "raw {} gave {}", raw, value);
            assert!(value >= previous, "Not monotonic at raw {}", raw);
            assert!(value.signum() * (raw - 2000).signum() >= 0, "Sign flipped at raw {}", raw);
            previous = value;
        }
    }

    #[test]
    fn test_asymmetric_extents() {
        let n = Normalizer::new(profile_with(2100, -250, 1000, 0), 350, 4096).unwrap();
        assert_eq!(n.normalize(&[1850; AXIS_COUNT])[0], -350);
        assert_eq!(n.normalize(&[3100; AXIS_COUNT])[0], 350);
        assert_eq!(n.normalize(&[2600; AXIS_COUNT])[0], 175);
    }

    // ==================== Centering Tests ====================

    #[test]
    fn test_inverted_axis_negates() {
        let mut profile = profile_with(2100, -500, 500, 10);
        profile.axes[1].invert = true;
        let n = Normalizer::new(profile, 350, 4096).unwrap();

        let centered = n.center(&[2600; AXIS_COUNT]);
        assert_eq!(centered[0], 500);
        assert_eq!(centered[1], -500);

        let out = n.normalize(&[2600; AXIS_COUNT]);
        assert_eq!(out[0], 350);
        assert_eq!(out[1], -350);
    }

    #[test]
    fn test_set_zero_moves_rest_point() {
        let mut n = normalizer();
        n.set_zero(&[1400; AXIS_COUNT]);
        assert_eq!(n.normalize(&[1400; AXIS_COUNT]), [0; AXIS_COUNT]);
        assert_eq!(n.profile().axes[4].zero, 1400);
    }

    #[test]
    fn test_set_profile_rejects_invalid_and_keeps_old() {
        let mut n = normalizer();
        let bad = profile_with(2100, -5, 500, 10);
        assert!(n.set_profile(bad, 4096).is_err());
        assert_eq!(n.profile().axes[0].min, -500);

        let good = profile_with(2100, -250, 250, 10);
        n.set_profile(good, 4096).unwrap();
        assert_eq!(n.normalize(&[2350; AXIS_COUNT])[0], 350);
    }

    #[test]
    fn test_idle_is_idempotent() {
        let n = normalizer();
        let first = n.normalize(&[2103; AXIS_COUNT]);
        for _ in 0..100 {
            assert_eq!(n.normalize(&[2103; AXIS_COUNT]), first);
        }
    }
}
