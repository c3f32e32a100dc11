//! # Response Shaper
//!
//! Turns raw kinematic components into the velocities reported to the host.
//!
//! Per component, in order:
//!
//! 1. Divide by the sensitivity (values below 1.0 make the axis more sensitive)
//! 2. Clamp to `[-S, S]` and apply the response curve
//! 3. Gate: magnitudes below the component's threshold become 0
//! 4. Optional sign inversion
//!
//! Negative Z has its own sensitivity and gate. Positive Z (pulling the knob
//! up, which needs more force) is linear by default.
//!
//! Afterwards the X/Y and Y/Z component pairs can be swapped to match the
//! host application's coordinate convention.
//!
//! ## Response Curves
//!
//! With `x` normalized to `[-1, 1]` and the result scaled back by S:
//!
//! | Curve | Formula |
//! |-------|---------|
//! | `linear` | `x` |
//! | `squared` | `x² · sign(x)` |
//! | `tangent` | `tan(x)` |
//! | `squared_tangent` | `tan(x² · sign(x))` |
//! | `cubed_tangent` | `tan(x³)` |
//!
//! Results are clamped to `[-S, S]` and rounded half away from zero.

use serde::Deserialize;

use super::VelocityVector;
use crate::config::ResponseConfig;

/// Nonlinear response curve applied to every shaped component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCurve {
    /// No modification.
    Linear,
    /// Flatter near zero, full deflection preserved.
    Squared,
    /// Linear near zero, steeper towards the ends.
    Tangent,
    /// Flat near zero, steep towards the ends.
    #[default]
    SquaredTangent,
    /// Very flat near zero, very steep towards the ends.
    CubedTangent,
}

impl ResponseCurve {
    /// Evaluates the curve for `x` on the scale `[-scale, scale]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use spacemouse_core::motion::response::ResponseCurve;
    ///
    /// assert_eq!(ResponseCurve::Linear.apply(120, 350), 120);
    /// assert_eq!(ResponseCurve::Squared.apply(175, 350), 88);
    /// assert_eq!(ResponseCurve::Squared.apply(-175, 350), -88);
    /// assert_eq!(ResponseCurve::Tangent.apply(350, 350), 350);
    /// ```
    #[must_use]
    pub fn apply(self, x: i32, scale: i32) -> i32 {
        let s = f64::from(scale);
        let x = f64::from(x.clamp(-scale, scale)) / s;
        let y = match self {
            Self::Linear => x,
            Self::Squared => x * x * x.signum(),
            Self::Tangent => x.tan(),
            Self::SquaredTangent => (x * x * x.signum()).tan(),
            Self::CubedTangent => (x * x * x).tan(),
        };
        (s * y).clamp(-s, s).round() as i32
    }
}

/// Shaping parameters of one velocity component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentResponse {
    /// Divisor applied before the curve.
    pub sensitivity: f32,
    /// Shaped magnitudes below this become 0.
    pub gate: i32,
}

impl Default for ComponentResponse {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            gate: 0,
        }
    }
}

/// Per-component inversion flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inversion {
    pub tx: bool,
    pub ty: bool,
    pub tz: bool,
    pub rx: bool,
    pub ry: bool,
    pub rz: bool,
}

/// Sensitivity, curve, gating, inversion and swaps for all six components.
#[derive(Debug, Clone)]
pub struct ResponseShaper {
    scale: i32,
    curve: ResponseCurve,
    tx: ComponentResponse,
    ty: ComponentResponse,
    tz_pos: ComponentResponse,
    tz_neg: ComponentResponse,
    rx: ComponentResponse,
    ry: ComponentResponse,
    rz: ComponentResponse,
    linear_positive_z: bool,
    invert: Inversion,
    switch_xy: bool,
    switch_yz: bool,
}

impl ResponseShaper {
    /// Creates a shaper applying `curve` to every component, unit
    /// sensitivity, no gates, no inversion and no swaps.
    #[must_use]
    pub fn new(scale: i32, curve: ResponseCurve) -> Self {
        Self {
            scale,
            curve,
            tx: ComponentResponse::default(),
            ty: ComponentResponse::default(),
            tz_pos: ComponentResponse::default(),
            tz_neg: ComponentResponse::default(),
            rx: ComponentResponse::default(),
            ry: ComponentResponse::default(),
            rz: ComponentResponse::default(),
            linear_positive_z: false,
            invert: Inversion::default(),
            switch_xy: false,
            switch_yz: false,
        }
    }

    /// Creates a shaper from the `[response]` configuration section.
    #[must_use]
    pub fn from_config(config: &ResponseConfig) -> Self {
        let component = |sensitivity: f32, gate: i32| ComponentResponse { sensitivity, gate };
        Self {
            scale: config.scale,
            curve: config.curve,
            tx: component(config.sensitivity.tx, config.gate.tx),
            ty: component(config.sensitivity.ty, config.gate.ty),
            tz_pos: component(config.sensitivity.tz_pos, config.gate.tz_pos),
            tz_neg: component(config.sensitivity.tz_neg, config.gate.tz_neg),
            rx: component(config.sensitivity.rx, config.gate.rx),
            ry: component(config.sensitivity.ry, config.gate.ry),
            rz: component(config.sensitivity.rz, config.gate.rz),
            linear_positive_z: config.linear_positive_z,
            invert: Inversion {
                tx: config.invert.tx,
                ty: config.invert.ty,
                tz: config.invert.tz,
                rx: config.invert.rx,
                ry: config.invert.ry,
                rz: config.invert.rz,
            },
            switch_xy: config.switch_xy,
            switch_yz: config.switch_yz,
        }
    }

    /// Replaces the inversion flags.
    #[must_use]
    pub fn with_inversion(mut self, invert: Inversion) -> Self {
        self.invert = invert;
        self
    }

    /// Enables the X/Y and Y/Z swaps.
    #[must_use]
    pub fn with_swaps(mut self, switch_xy: bool, switch_yz: bool) -> Self {
        self.switch_xy = switch_xy;
        self.switch_yz = switch_yz;
        self
    }

    /// Keeps positive Z linear instead of applying the curve.
    #[must_use]
    pub fn with_linear_positive_z(mut self, linear: bool) -> Self {
        self.linear_positive_z = linear;
        self
    }

    /// Replaces the gates, in `[tx, ty, tz_pos, tz_neg, rx, ry, rz]` order.
    #[must_use]
    pub fn with_gates(mut self, gates: [i32; 7]) -> Self {
        let [tx, ty, tz_pos, tz_neg, rx, ry, rz] = gates;
        self.tx.gate = tx;
        self.ty.gate = ty;
        self.tz_pos.gate = tz_pos;
        self.tz_neg.gate = tz_neg;
        self.rx.gate = rx;
        self.ry.gate = ry;
        self.rz.gate = rz;
        self
    }

    /// Replaces the sensitivities, in `[tx, ty, tz_pos, tz_neg, rx, ry, rz]` order.
    #[must_use]
    pub fn with_sensitivities(mut self, sensitivities: [f32; 7]) -> Self {
        let [tx, ty, tz_pos, tz_neg, rx, ry, rz] = sensitivities;
        self.tx.sensitivity = tx;
        self.ty.sensitivity = ty;
        self.tz_pos.sensitivity = tz_pos;
        self.tz_neg.sensitivity = tz_neg;
        self.rx.sensitivity = rx;
        self.ry.sensitivity = ry;
        self.rz.sensitivity = rz;
        self
    }

    /// Shapes one raw kinematic vector.
    #[must_use]
    pub fn shape(&self, raw: &VelocityVector) -> VelocityVector {
        let tz = if raw.tz < 0 {
            self.shape_component(raw.tz, &self.tz_neg, true)
        } else {
            self.shape_component(raw.tz, &self.tz_pos, !self.linear_positive_z)
        };

        let mut v = VelocityVector {
            tx: self.shape_component(raw.tx, &self.tx, true),
            ty: self.shape_component(raw.ty, &self.ty, true),
            tz,
            rx: self.shape_component(raw.rx, &self.rx, true),
            ry: self.shape_component(raw.ry, &self.ry, true),
            rz: self.shape_component(raw.rz, &self.rz, true),
        };

        let flip = |value: i32, invert: bool| if invert { -value } else { value };
        v.tx = flip(v.tx, self.invert.tx);
        v.ty = flip(v.ty, self.invert.ty);
        v.tz = flip(v.tz, self.invert.tz);
        v.rx = flip(v.rx, self.invert.rx);
        v.ry = flip(v.ry, self.invert.ry);
        v.rz = flip(v.rz, self.invert.rz);

        if self.switch_xy {
            std::mem::swap(&mut v.tx, &mut v.ty);
            std::mem::swap(&mut v.rx, &mut v.ry);
        }
        if self.switch_yz {
            std::mem::swap(&mut v.ty, &mut v.tz);
            std::mem::swap(&mut v.ry, &mut v.rz);
        }
        v
    }

    fn shape_component(&self, value: i32, response: &ComponentResponse, curved: bool) -> i32 {
        // Float-to-int `as` truncates toward zero and saturates
        let divided = (value as f32 / response.sensitivity) as i32;
        let shaped = if curved {
            self.curve.apply(divided, self.scale)
        } else {
            divided.clamp(-self.scale, self.scale)
        };
        if shaped.abs() < response.gate {
            0
        } else {
            shaped
        }
    }
}
