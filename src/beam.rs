use crate::error::ModelError;
use crate::grid::arange;

use ndarray::{Array2, ArrayView2, s};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Instrument beam as a sum of two circular Gaussians
///
/// FWHMs are in the same units as the pixel size passed to [`DoubleGaussianBeam::kernel`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DoubleGaussianBeam {
    pub fwhm1: f64,
    pub amp1: f64,
    pub fwhm2: f64,
    pub amp2: f64,
}

impl DoubleGaussianBeam {
    /// Beam kernel sampled with pixel size `dr` and normalised to unit sum
    ///
    /// Pixel offsets run over `floor(-1.5 fwhm1 / dr)..floor(1.5 fwhm1 / dr)`, so the beam centre
    /// sits at index `side - side / 2`, which is the origin convention of the convolution.
    pub fn kernel(&self, dr: f64) -> Result<Array2<f64>, ModelError> {
        let extent = 1.5 * self.fwhm1 / dr;
        let axis = arange((-extent).floor(), extent.floor(), 1.0).mapv(|i| i * dr);
        if axis.is_empty() {
            return Err(ModelError::EmptyBeam);
        }
        let n = axis.len();
        let ln2x4 = 4.0 * std::f64::consts::LN_2;
        let mut beam = Array2::from_shape_fn((n, n), |(i, j)| {
            let rr = axis[i].powi(2) + axis[j].powi(2);
            self.amp1 * f64::exp(-ln2x4 * rr / self.fwhm1.powi(2))
                + self.amp2 * f64::exp(-ln2x4 * rr / self.fwhm2.powi(2))
        });
        let total = beam.sum();
        beam /= total;
        Ok(beam)
    }
}

/// Zero-pad `beam` to `shape`, centring it
///
/// Leading pads are `(N - b) / 2` (integer division) along each axis, so an odd size difference
/// leaves the extra pixel on the trailing edge.
pub fn pad_beam(beam: ArrayView2<f64>, shape: (usize, usize)) -> Result<Array2<f64>, ModelError> {
    let (bx, by) = beam.dim();
    if bx == 0 || by == 0 {
        return Err(ModelError::EmptyBeam);
    }
    if bx > shape.0 || by > shape.1 {
        return Err(ModelError::BeamLargerThanMap {
            beam: (bx, by),
            map: shape,
        });
    }
    let lead0 = (shape.0 - bx) / 2;
    let lead1 = (shape.1 - by) / 2;
    let mut padded = Array2::zeros(shape);
    padded
        .slice_mut(s![lead0..lead0 + bx, lead1..lead1 + by])
        .assign(&beam);
    Ok(padded)
}
