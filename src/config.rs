use crate::beam::DoubleGaussianBeam;
use crate::error::ModelError;
use crate::grid::CoordinateGrid;
use crate::layout::ComponentCounts;
use crate::model::Model;
use crate::units::{Cosmology, dz_factor, y_to_k_rj};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where Gaussian components enter the model
///
/// Gaussians are historically applied twice: once to the pressure volume before the line of sight
/// integral and once to the beam-convolved map. [`GaussianPlacement::Both`] keeps that behaviour,
/// the other variants isolate one of the two contributions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GaussianPlacement {
    #[default]
    Both,
    VolumeOnly,
    MapOnly,
}

impl GaussianPlacement {
    #[inline]
    pub fn in_volume(self) -> bool {
        matches!(self, Self::Both | Self::VolumeOnly)
    }

    #[inline]
    pub fn on_map(self) -> bool {
        matches!(self, Self::Both | Self::MapOnly)
    }
}

/// Initialisation-time options of [`Model`]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ModelOptions {
    pub gaussian_placement: GaussianPlacement,
    /// Background used by the mass-parametrised pressure profiles
    pub cosmology: Cosmology,
}

/// Observation set-up: map geometry, instrument beam and spectral conversion
///
/// Derives everything [`Model::new`] needs from a handful of physical numbers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ObservationConfig {
    /// Cluster redshift
    pub z: f64,
    /// Half-size of the modelled cube in arcsec
    pub r_map: f64,
    /// Pixel size in arcsec
    pub dr: f64,
    /// Electron temperature in keV for the relativistic SZ correction
    #[serde(default)]
    pub t_e: f64,
    /// Observing frequency in Hz
    pub frequency: f64,
    pub beam: DoubleGaussianBeam,
}

impl ObservationConfig {
    pub fn grid(&self) -> Result<CoordinateGrid, ModelError> {
        CoordinateGrid::cube(self.r_map, self.dr)
    }

    pub fn beam_kernel(&self) -> Result<ndarray::Array2<f64>, ModelError> {
        self.beam.kernel(self.dr)
    }

    pub fn mpc_per_arcsec(&self, cosmology: &Cosmology) -> f64 {
        cosmology.mpc_per_arcsec(self.z)
    }

    /// Compton-y to K_RJ conversion at the observing frequency
    pub fn y_to_k(&self) -> f64 {
        y_to_k_rj(self.frequency, self.t_e)
    }

    /// Line-of-sight integration factor turning keV cm⁻³ pressure into K_RJ
    pub fn dz(&self, cosmology: &Cosmology) -> f64 {
        dz_factor(self.y_to_k(), self.dr, self.mpc_per_arcsec(cosmology))
    }

    pub fn build_model(
        &self,
        counts: ComponentCounts,
        options: ModelOptions,
    ) -> Result<Model, ModelError> {
        let grid = self.grid()?;
        let beam = self.beam_kernel()?;
        let dz = self.dz(&options.cosmology);
        Model::new(grid, counts, dz, beam.view(), options)
    }
}
