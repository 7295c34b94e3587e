//! Additive pressure profiles: isothermal beta model and generalised NFW variants

use super::VolumeProfile;
use super::geometry::{Frame, floored_radius};
use crate::float_trait::LikeFloat;
use crate::units::Cosmology;

pub const ISOBETA_PARAMS: [&str; 9] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "beta", "amp",
];

pub const GNFW_PARAMS: [&str; 14] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "p0", "c500", "m500", "gamma", "alpha", "beta",
    "z",
];

pub const A10_PARAMS: [&str; 15] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "p0", "c500", "m500", "gamma", "alpha", "beta",
    "z", "alpha_p",
];

/// Universal pressure normalisation slope of Arnaud et al. (2010)
pub const ALPHA_P_FIXED: f64 = 0.12;

/// Isothermal beta model, `amp * (1 + x² + y² + z²)^(-3β/2)`
///
/// Scale radii are core radii in grid units.
#[derive(Clone, Debug)]
pub struct Isobeta<U> {
    frame: Frame<U>,
    power: U,
    amp: U,
}

impl<U: LikeFloat> VolumeProfile<U> for Isobeta<U> {
    fn from_params(p: &[U], _cosmology: &Cosmology) -> Self {
        Self {
            frame: Frame::from_slice(p),
            power: U::constant(-1.5) * p[7],
            amp: p[8],
        }
    }

    #[inline]
    fn at(&self, x: f64, y: f64, z: f64) -> U {
        let (x, y, z) = self.frame.transform(x, y, z);
        self.amp * (U::one() + x * x + y * y + z * z).powf(self.power)
    }
}

/// Mass-derived quantities shared by the gNFW-like profiles
struct Halo<U> {
    /// `r500` in grid units (arcsec)
    r500: U,
    /// `P500` in keV cm⁻³ without the `(M / 3e14)^α_p` factor
    p500: U,
    /// `ln(M500 / 3e14 h70⁻¹)`
    ln_mass: U,
}

impl<U: LikeFloat> Halo<U> {
    fn new(m500: U, z: U, cosmology: &Cosmology) -> Self {
        let h70 = U::constant(cosmology.h70());
        let rho_c = cosmology.critical_density(z);
        // hyperdual's cbrt doubles the tangent
        let r500_mpc = (U::constant(3.0) * m500
            / (U::constant(4.0 * std::f64::consts::PI * 500.0) * rho_c))
            .powf(U::constant(1.0 / 3.0));
        let r500 = r500_mpc / cosmology.mpc_per_arcsec(z);
        let ln_mass = (m500 * h70 / U::constant(3e14)).ln();
        let p500 = U::constant(1.65e-3)
            * cosmology.e_z(z).powf(U::constant(8.0 / 3.0))
            * (U::constant(2.0 / 3.0) * ln_mass).exp()
            * h70
            * h70;
        Self {
            r500,
            p500,
            ln_mass,
        }
    }
}

/// Shape parameters of the generalised NFW profile
#[derive(Clone, Debug)]
struct GnfwShape<U> {
    c500: U,
    gamma: U,
    alpha: U,
    outer: U,
}

impl<U: LikeFloat> GnfwShape<U> {
    fn new(c500: U, gamma: U, alpha: U, beta: U) -> Self {
        Self {
            c500,
            gamma,
            alpha,
            outer: (beta - gamma) / alpha,
        }
    }

    /// `1 / (u^γ (1 + u^α)^((β - γ) / α))` with `u = c500 * x`
    #[inline]
    fn at(&self, x: U) -> U {
        let u = self.c500 * x;
        (u.powf(self.gamma) * (U::one() + u.powf(self.alpha)).powf(self.outer)).recip()
    }
}

/// Generalised NFW pressure profile with the self-similar mass scaling
///
/// Scale radii are in units of `r500`, which is derived from `m500` (solar masses) and the
/// redshift `z`; amplitudes are in keV cm⁻³.
#[derive(Clone, Debug)]
pub struct Gnfw<U> {
    frame: Frame<U>,
    shape: GnfwShape<U>,
    norm: U,
}

impl<U: LikeFloat> VolumeProfile<U> for Gnfw<U> {
    fn from_params(p: &[U], cosmology: &Cosmology) -> Self {
        let halo = Halo::new(p[9], p[13], cosmology);
        Self {
            frame: Frame::from_slice(p).scaled(halo.r500),
            shape: GnfwShape::new(p[8], p[10], p[11], p[12]),
            norm: p[7] * halo.p500 * (U::constant(ALPHA_P_FIXED) * halo.ln_mass).exp(),
        }
    }

    #[inline]
    fn at(&self, x: f64, y: f64, z: f64) -> U {
        let (x, y, z) = self.frame.transform(x, y, z);
        self.norm * self.shape.at(floored_radius(x * x + y * y + z * z))
    }
}

/// Arnaud et al. (2010) universal pressure profile with the radius-dependent mass slope
///
/// `α'_p(x) = 0.10 - (α_p + 0.10) (2x)³ / (1 + (2x)³)` with `x = r / r500`.
#[derive(Clone, Debug)]
pub struct A10<U> {
    frame: Frame<U>,
    shape: GnfwShape<U>,
    norm: U,
    alpha_p: U,
    ln_mass: U,
}

impl<U: LikeFloat> VolumeProfile<U> for A10<U> {
    fn from_params(p: &[U], cosmology: &Cosmology) -> Self {
        let halo = Halo::new(p[9], p[13], cosmology);
        Self {
            frame: Frame::from_slice(p).scaled(halo.r500),
            shape: GnfwShape::new(p[8], p[10], p[11], p[12]),
            norm: p[7] * halo.p500,
            alpha_p: p[14],
            ln_mass: halo.ln_mass,
        }
    }

    #[inline]
    fn at(&self, x: f64, y: f64, z: f64) -> U {
        let (x, y, z) = self.frame.transform(x, y, z);
        let r = floored_radius(x * x + y * y + z * z);
        let tenth = U::constant(0.10);
        let cube = (U::two() * r).powi(3);
        let running = tenth - (self.alpha_p + tenth) * cube / (U::one() + cube);
        let mass_factor = ((self.alpha_p + running) * self.ln_mass).exp();
        self.norm * mass_factor * self.shape.at(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::float_trait::Dual64;

    use approx::assert_relative_eq;

    fn gnfw_params() -> Vec<f64> {
        vec![
            0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 8.403, 1.177, 6e14, 0.3081, 1.0510, 5.4905, 0.3,
        ]
    }

    #[test]
    fn isobeta_core_value_is_amplitude() {
        let p = [0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 0.0, 0.8, 3.0];
        let profile = Isobeta::from_params(&p, &Cosmology::default());
        assert_relative_eq!(profile.at(0.0, 0.0, 0.0), 3.0, epsilon = 1e-14);
        // r = core radius: 2^(-1.2)
        assert_relative_eq!(profile.at(5.0, 0.0, 0.0), 3.0 * 2f64.powf(-1.2), epsilon = 1e-14);
        assert_relative_eq!(profile.at(0.0, 0.0, -5.0), profile.at(0.0, 5.0, 0.0), epsilon = 1e-14);
    }

    #[test]
    fn gnfw_matches_direct_formula() {
        let cosmo = Cosmology::default();
        let p = gnfw_params();
        let profile = Gnfw::from_params(&p, &cosmo);

        let z = p[13];
        let rho_c = cosmo.critical_density(z);
        let r500_mpc = (3.0 * p[9] / (4.0 * std::f64::consts::PI * 500.0 * rho_c)).cbrt();
        let r500 = r500_mpc / cosmo.mpc_per_arcsec(z);
        let p500 = 1.65e-3 * cosmo.e_z(z).powf(8.0 / 3.0) * (p[9] / 3e14).powf(2.0 / 3.0 + 0.12);

        let radius = 0.5 * r500;
        let u = p[8] * 0.5;
        let shape = u.powf(p[10]) * (1.0 + u.powf(p[11])).powf((p[12] - p[10]) / p[11]);
        let expected = p[7] * p500 / shape;
        assert_relative_eq!(profile.at(radius, 0.0, 0.0), expected, max_relative = 1e-12);
        assert_relative_eq!(profile.at(0.0, 0.0, radius), expected, max_relative = 1e-12);
    }

    #[test]
    fn gnfw_is_finite_at_centre() {
        let profile = Gnfw::from_params(&gnfw_params(), &Cosmology::default());
        let centre = profile.at(0.0, 0.0, 0.0);
        assert!(centre.is_finite());
        assert!(centre > profile.at(1.0, 0.0, 0.0));
    }

    #[test]
    fn a10_reduces_to_gnfw_at_half_r500_with_canonical_slope() {
        // at x = 0.5: (2x)^3 = 1 so alpha'_p = 0.10 - (0.12 + 0.10) / 2 = -0.01
        let cosmo = Cosmology::default();
        let gnfw_p = gnfw_params();
        let mut a10_p = gnfw_p.clone();
        a10_p.push(ALPHA_P_FIXED);
        let gnfw = Gnfw::from_params(&gnfw_p, &cosmo);
        let a10 = A10::from_params(&a10_p, &cosmo);
        let halo = Halo::new(gnfw_p[9], gnfw_p[13], &cosmo);
        let radius = 0.5 * halo.r500;
        let mass_ratio = halo.ln_mass.exp();
        assert_relative_eq!(
            a10.at(radius, 0.0, 0.0),
            gnfw.at(radius, 0.0, 0.0) * mass_ratio.powf(-0.01),
            max_relative = 1e-12
        );
    }

    #[test]
    fn halo_derivatives_match_finite_differences() {
        let cosmo = Cosmology::default();
        let (m500, z) = (6e14, 0.3);
        let r500 = |m: f64, z: f64| Halo::new(m, z, &cosmo).r500;

        let dual = Halo::new(Dual64::from_parts(m500, 1.0), Dual64::constant(z), &cosmo);
        let h = 1e-6 * m500;
        let expected = (r500(m500 + h, z) - r500(m500 - h, z)) / (2.0 * h);
        assert_relative_eq!(dual.r500.value(), r500(m500, z), max_relative = 1e-14);
        assert_relative_eq!(dual.r500.tangent(), expected, max_relative = 1e-6);
        // r500 scales as M^(1/3)
        assert_relative_eq!(
            dual.r500.tangent(),
            r500(m500, z) / (3.0 * m500),
            max_relative = 1e-12
        );

        let dual = Halo::new(Dual64::constant(m500), Dual64::from_parts(z, 1.0), &cosmo);
        let h = 1e-6;
        let expected = (r500(m500, z + h) - r500(m500, z - h)) / (2.0 * h);
        assert_relative_eq!(dual.r500.tangent(), expected, max_relative = 1e-6);
        let expected = (Halo::new(m500, z + h, &cosmo).p500 - Halo::new(m500, z - h, &cosmo).p500)
            / (2.0 * h);
        assert_relative_eq!(dual.p500.tangent(), expected, max_relative = 1e-6);
    }
}
