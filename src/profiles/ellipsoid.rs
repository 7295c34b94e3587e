//! Substructure modifiers acting inside the unit ellipsoid of their frame
//!
//! Each modifier multiplies the accumulated pressure by `1 + f` where `x² + y² + z² ≤ 1` in the
//! modifier frame and leaves it untouched elsewhere.

use super::geometry::{Frame, RADIUS_FLOOR, floored_radius, polar_angle};
use crate::float_trait::LikeFloat;

pub const UNIFORM_PARAMS: [&str; 8] = ["dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "amp"];

pub const EXPONENTIAL_PARAMS: [&str; 14] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "amp", "xk", "x0", "yk", "y0", "zk", "z0",
];

pub const POWERLAW_PARAMS: [&str; 11] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "amp", "phi0", "k_r", "k_phi",
];

pub const POWERLAW_COS_PARAMS: [&str; 11] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "amp", "phi0", "k_r", "omega",
];

pub(crate) trait Modifier<U: LikeFloat>: Sized + Sync {
    fn from_params(p: &[U]) -> Self;

    /// Frame of the modifier, defines its ellipsoid
    fn frame(&self) -> &Frame<U>;

    /// `f` at a point of the modifier frame, only called inside the ellipsoid
    fn modulation(&self, x: U, y: U, z: U, rr: U) -> U;

    /// Multiplicative factor `1 + f` at a grid point, `None` outside the ellipsoid
    #[inline]
    fn factor(&self, x: f64, y: f64, z: f64) -> Option<U> {
        let (x, y, z) = self.frame().transform(x, y, z);
        let rr = x * x + y * y + z * z;
        (rr.value() <= 1.0).then(|| U::one() + self.modulation(x, y, z, rr))
    }
}

/// Constant fractional boost `f = amp`
#[derive(Clone, Debug)]
pub struct Uniform<U> {
    frame: Frame<U>,
    amp: U,
}

impl<U: LikeFloat> Modifier<U> for Uniform<U> {
    fn from_params(p: &[U]) -> Self {
        Self {
            frame: Frame::from_slice(p),
            amp: p[7],
        }
    }

    fn frame(&self) -> &Frame<U> {
        &self.frame
    }

    #[inline]
    fn modulation(&self, _x: U, _y: U, _z: U, _rr: U) -> U {
        self.amp
    }
}

/// `f = amp * exp(xk (x - x0) + yk (y - y0) + zk (z - z0))`
#[derive(Clone, Debug)]
pub struct Exponential<U> {
    frame: Frame<U>,
    amp: U,
    k: [U; 3],
    origin: [U; 3],
}

impl<U: LikeFloat> Modifier<U> for Exponential<U> {
    fn from_params(p: &[U]) -> Self {
        Self {
            frame: Frame::from_slice(p),
            amp: p[7],
            k: [p[8], p[10], p[12]],
            origin: [p[9], p[11], p[13]],
        }
    }

    fn frame(&self) -> &Frame<U> {
        &self.frame
    }

    #[inline]
    fn modulation(&self, x: U, y: U, z: U, _rr: U) -> U {
        let exponent = self.k[0] * (x - self.origin[0])
            + self.k[1] * (y - self.origin[1])
            + self.k[2] * (z - self.origin[2]);
        self.amp * exponent.exp()
    }
}

/// `f = amp * r^k_r * φ^k_phi`, `φ ∈ [0, 1]` is the angular distance from `phi0` over π
#[derive(Clone, Debug)]
pub struct PowerLaw<U> {
    frame: Frame<U>,
    amp: U,
    phi0: U,
    k_r: U,
    k_phi: U,
}

impl<U: LikeFloat> Modifier<U> for PowerLaw<U> {
    fn from_params(p: &[U]) -> Self {
        Self {
            frame: Frame::from_slice(p),
            amp: p[7],
            phi0: p[8],
            k_r: p[9],
            k_phi: p[10],
        }
    }

    fn frame(&self) -> &Frame<U> {
        &self.frame
    }

    #[inline]
    fn modulation(&self, x: U, y: U, _z: U, rr: U) -> U {
        let r = floored_radius(rr);
        let delta = polar_angle(x, y) - self.phi0;
        // wrap into (-π, π]
        let wrapped = delta.sin().atan2(delta.cos()).abs();
        let phi = (wrapped / U::constant(std::f64::consts::PI)).max(U::constant(RADIUS_FLOOR));
        self.amp * r.powf(self.k_r) * phi.powf(self.k_phi)
    }
}

/// `f = amp * r^k_r * cos(omega (φ - phi0))` with `φ` the polar angle in the plane of sky
#[derive(Clone, Debug)]
pub struct PowerLawCos<U> {
    frame: Frame<U>,
    amp: U,
    phi0: U,
    k_r: U,
    omega: U,
}

impl<U: LikeFloat> Modifier<U> for PowerLawCos<U> {
    fn from_params(p: &[U]) -> Self {
        Self {
            frame: Frame::from_slice(p),
            amp: p[7],
            phi0: p[8],
            k_r: p[9],
            omega: p[10],
        }
    }

    fn frame(&self) -> &Frame<U> {
        &self.frame
    }

    #[inline]
    fn modulation(&self, x: U, y: U, _z: U, rr: U) -> U {
        let r = floored_radius(rr);
        let phi = polar_angle(x, y);
        self.amp * r.powf(self.k_r) * (self.omega * (phi - self.phi0)).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn frame_params() -> [f64; 7] {
        [0.0, 0.0, 0.0, 2.0, 2.0, 2.0, 0.0]
    }

    fn with_frame(rest: &[f64]) -> Vec<f64> {
        frame_params().iter().chain(rest).copied().collect()
    }

    #[test]
    fn uniform_only_acts_inside_ellipsoid() {
        let m = Uniform::from_params(&with_frame(&[0.5]));
        assert_eq!(m.factor(0.0, 0.0, 0.0), Some(1.5));
        assert_eq!(m.factor(2.0, 0.0, 0.0), Some(1.5));
        assert_eq!(m.factor(1.5, 1.5, 0.0), None);
        assert_eq!(m.factor(0.0, 0.0, 2.5), None);
    }

    #[test]
    fn exponential_is_amp_at_its_origin() {
        let m = Exponential::from_params(&with_frame(&[0.3, 1.0, 0.5, -2.0, 0.0, 0.0, 0.0]));
        // (1, 0, 0) in grid units is (0.5, 0, 0) in the frame
        assert_relative_eq!(m.factor(1.0, 0.0, 0.0).unwrap(), 1.3, epsilon = 1e-14);
        assert_relative_eq!(
            m.factor(0.0, 0.0, 0.0).unwrap(),
            1.0 + 0.3 * f64::exp(-0.5),
            epsilon = 1e-14
        );
    }

    #[test]
    fn powerlaw_angle_is_distance_from_phi0() {
        let m = PowerLaw::from_params(&with_frame(&[1.0, FRAC_PI_2, 0.0, 1.0]));
        // on the +y axis the angle equals phi0
        assert_relative_eq!(m.factor(0.0, 1.0, 0.0).unwrap(), 1.0, epsilon = 1e-9);
        // opposite direction: phi = 1
        assert_relative_eq!(m.factor(0.0, -1.0, 0.0).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(m.factor(1.0, 0.0, 0.0).unwrap(), 1.5, epsilon = 1e-12);
        // wrap-around: -3π/4 from phi0 = π/2 is 3π/4 away
        let (x, y) = ((-PI / 4.0).cos(), (-PI / 4.0).sin());
        assert_relative_eq!(m.factor(x, y, 0.0).unwrap(), 1.75, epsilon = 1e-12);
    }

    #[test]
    fn powerlaw_radius_exponent() {
        let m = PowerLaw::from_params(&with_frame(&[0.4, 0.0, 2.0, 0.0]));
        // r = 0.5 in the frame
        assert_relative_eq!(m.factor(0.0, 0.0, 1.0).unwrap(), 1.0 + 0.4 * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn powerlaw_cos_oscillates_with_angle() {
        let m = PowerLawCos::from_params(&with_frame(&[0.2, 0.0, 0.0, 2.0]));
        assert_relative_eq!(m.factor(1.0, 0.0, 0.0).unwrap(), 1.2, epsilon = 1e-12);
        assert_relative_eq!(m.factor(0.0, 1.0, 0.0).unwrap(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(m.factor(-1.0, 0.0, 0.0).unwrap(), 1.2, epsilon = 1e-12);
    }
}
