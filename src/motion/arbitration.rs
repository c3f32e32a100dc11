//! Kill keys and exclusive-mode arbitration between translation and rotation.

use serde::Deserialize;

use super::VelocityVector;
use crate::sensor::keys::ButtonState;

/// Category kept by exclusive mode when translation and rotation magnitudes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusiveTie {
    #[default]
    Translation,
    Rotation,
}

/// Buttons that suppress a motion category while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KillKeys {
    /// Held: rotation components are zeroed.
    pub rotation: Option<usize>,
    /// Held: translation components are zeroed.
    pub translation: Option<usize>,
}

/// Final per-cycle filter before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arbiter {
    exclusive: Option<ExclusiveTie>,
    kill: KillKeys,
}

impl Arbiter {
    /// `exclusive` enables exclusive mode with the given tie-break.
    #[must_use]
    pub fn new(exclusive: Option<ExclusiveTie>, kill: KillKeys) -> Self {
        Self { exclusive, kill }
    }

    /// Applies kill keys, then exclusive mode.
    #[must_use]
    pub fn apply(&self, velocity: &VelocityVector, buttons: &ButtonState) -> VelocityVector {
        let mut v = *velocity;

        if self.kill.rotation.is_some_and(|key| buttons.is_pressed(key)) {
            v.clear_rotation();
        }
        if self.kill.translation.is_some_and(|key| buttons.is_pressed(key)) {
            v.clear_translation();
        }

        if let Some(tie) = self.exclusive {
            let translation = v.total_translation();
            let rotation = v.total_rotation();
            let keep_rotation = match rotation.cmp(&translation) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => tie == ExclusiveTie::Rotation,
            };
            if keep_rotation {
                v.clear_translation();
            } else {
                v.clear_rotation();
            }
        }
        v
    }
}
