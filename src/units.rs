//! Physical constants and unit-conversion scalars
//!
//! Everything that may depend on a fitted parameter (the cluster redshift enters the gNFW and
//! A10 profiles) is generic over [`LikeFloat`] so derivatives flow through it.

use crate::float_trait::LikeFloat;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Megaparsec in centimetres
pub const MPC_CM: f64 = 3.0856775814913673e24;

/// Thomson cross-section in cm²
pub const SIGMA_T_CM2: f64 = 6.6524587321e-25;

/// Electron rest energy in keV
pub const ME_KEV: f64 = 510.99895;

/// Speed of light in km/s
pub const C_KM_S: f64 = 299_792.458;

/// CMB temperature in K
pub const T_CMB: f64 = 2.7255;

/// Planck constant in J s
pub const H_PLANCK: f64 = 6.626_070_15e-34;

/// Boltzmann constant in J / K
pub const K_BOLTZMANN: f64 = 1.380_649e-23;

/// Critical density today for h = 1, in solar masses per Mpc³
pub const RHO_CRIT_H2: f64 = 2.775_366_27e11;

/// Radians to arcseconds
pub const RAD_TO_ARCSEC: f64 = 180.0 * 3600.0 / std::f64::consts::PI;

const DISTANCE_INTEGRAL_STEPS: usize = 128;

/// Flat or curved ΛCDM background used for distances and densities
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Cosmology {
    /// Hubble constant in km/s/Mpc
    pub h0: f64,
    pub omega_m: f64,
    pub omega_lambda: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            h0: 70.0,
            omega_m: 0.3,
            omega_lambda: 0.7,
        }
    }
}

impl Cosmology {
    /// `H0 / 70 km/s/Mpc`
    #[inline]
    pub fn h70(&self) -> f64 {
        self.h0 / 70.0
    }

    #[inline]
    fn omega_k(&self) -> f64 {
        1.0 - self.omega_m - self.omega_lambda
    }

    /// Dimensionless Hubble rate `E(z) = H(z) / H0`
    pub fn e_z<U: LikeFloat>(&self, z: U) -> U {
        let zp1 = U::one() + z;
        (U::constant(self.omega_m) * zp1.powi(3)
            + U::constant(self.omega_k()) * zp1.powi(2)
            + U::constant(self.omega_lambda))
        .sqrt()
    }

    /// Critical density at redshift `z` in solar masses per Mpc³
    pub fn critical_density<U: LikeFloat>(&self, z: U) -> U {
        let h = self.h0 / 100.0;
        U::constant(RHO_CRIT_H2 * h * h) * self.e_z(z).powi(2)
    }

    /// Line-of-sight comoving distance in Mpc, Simpson's rule over `1 / E(z)`
    pub fn comoving_distance<U: LikeFloat>(&self, z: U) -> U {
        let n = DISTANCE_INTEGRAL_STEPS;
        let step = z / U::constant(n as f64);
        let integrand = |i: usize| self.e_z(step * U::constant(i as f64)).recip();
        let mut sum = integrand(0) + integrand(n);
        for i in 1..n {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += U::constant(weight) * integrand(i);
        }
        U::constant(C_KM_S / self.h0) * sum * step / U::constant(3.0)
    }

    /// Angular-diameter distance in Mpc
    pub fn angular_diameter_distance<U: LikeFloat>(&self, z: U) -> U {
        let dc = self.comoving_distance(z);
        let omega_k = self.omega_k();
        let hubble_distance = C_KM_S / self.h0;
        let transverse = if omega_k.abs() < 1e-12 {
            dc
        } else {
            let sqrt_k = U::constant(omega_k.abs().sqrt() / hubble_distance);
            if omega_k > 0.0 {
                (sqrt_k * dc).sinh() / sqrt_k
            } else {
                (sqrt_k * dc).sin() / sqrt_k
            }
        };
        transverse / (U::one() + z)
    }

    /// Physical size subtended by one arcsecond at redshift `z`, in Mpc
    pub fn mpc_per_arcsec<U: LikeFloat>(&self, z: U) -> U {
        self.angular_diameter_distance(z) / U::constant(RAD_TO_ARCSEC)
    }
}

/// Conversion from Compton-y to Rayleigh–Jeans brightness temperature in K
///
/// `frequency` is in Hz and `t_e` is the electron temperature in keV. The thermal SZ spectrum
/// includes the first-order relativistic correction of Itoh et al. (1998); `t_e = 0` gives the
/// non-relativistic Kompaneets result.
pub fn y_to_k_rj(frequency: f64, t_e: f64) -> f64 {
    let x = H_PLANCK * frequency / (K_BOLTZMANN * T_CMB);
    let x_tilde = x / (0.5 * x).tanh();
    let s_tilde = x / (0.5 * x).sinh();
    let y0 = x_tilde - 4.0;
    let y1 = -10.0 + 23.5 * x_tilde - 8.4 * x_tilde.powi(2)
        + 0.7 * x_tilde.powi(3)
        + s_tilde.powi(2) * (-4.2 + 1.4 * x_tilde);
    let theta_e = t_e / ME_KEV;
    let spectrum = y0 + theta_e * y1;
    // ΔT_CMB / T_CMB into ΔT_RJ
    let rj_factor = x.powi(2) * x.exp() / x.exp_m1().powi(2);
    T_CMB * spectrum * rj_factor
}

/// Line-of-sight integration factor for pressure fields in keV cm⁻³ on an arcsecond grid
///
/// Combines the y-to-temperature conversion, the pixel depth `dr` (arcsec) converted to
/// centimetres, the Thomson cross-section and the electron rest energy, so that integrating
/// the pressure with this step gives a map in K_RJ.
pub fn dz_factor(y_to_k: f64, dr: f64, mpc_per_arcsec: f64) -> f64 {
    y_to_k * dr * mpc_per_arcsec * SIGMA_T_CM2 * MPC_CM / ME_KEV
}
