use crate::error::SamplerError;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::fmt::Debug;

/// Inverse noise covariance applied to detector-by-sample residuals
pub trait NoiseModel: Debug + Send + Sync {
    /// `N⁻¹ r` for a residual of shape `(ndet, nsamp)`
    fn apply_noise(&self, residual: ArrayView2<f64>) -> Result<Array2<f64>, SamplerError>;

    /// Error unless data of this shape can be whitened
    fn check_shape(&self, _shape: (usize, usize)) -> Result<(), SamplerError> {
        Ok(())
    }
}

/// Uncorrelated noise with a constant variance per detector
#[derive(Clone, Debug, PartialEq)]
pub struct WhiteNoise {
    inv_var: Array1<f64>,
}

impl WhiteNoise {
    /// From per-detector standard deviations, every one must be positive and finite
    pub fn from_std(std: Array1<f64>) -> Result<Self, SamplerError> {
        if let Some((det, &s)) = std
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(SamplerError::InvalidNoise(format!(
                "detector {det} has standard deviation {s}"
            )));
        }
        Ok(Self {
            inv_var: std.mapv(|s| s.powi(-2)),
        })
    }

    /// Per-detector sample standard deviation of `data` of shape `(ndet, nsamp)`
    pub fn estimate(data: ArrayView2<f64>) -> Result<Self, SamplerError> {
        if data.ncols() < 2 {
            return Err(SamplerError::InvalidNoise(format!(
                "{} samples per detector are not enough to estimate the noise",
                data.ncols()
            )));
        }
        Self::from_std(data.std_axis(Axis(1), 1.0))
    }

    #[inline]
    pub fn ndet(&self) -> usize {
        self.inv_var.len()
    }

    #[inline]
    pub fn inv_var(&self) -> &Array1<f64> {
        &self.inv_var
    }
}

impl NoiseModel for WhiteNoise {
    fn apply_noise(&self, residual: ArrayView2<f64>) -> Result<Array2<f64>, SamplerError> {
        self.check_shape(residual.dim())?;
        Ok(&residual * &self.inv_var.view().insert_axis(Axis(1)))
    }

    fn check_shape(&self, shape: (usize, usize)) -> Result<(), SamplerError> {
        if shape.0 == self.ndet() {
            Ok(())
        } else {
            Err(SamplerError::TodShapeMismatch(format!(
                "noise model has {} detectors, data have {}",
                self.ndet(),
                shape.0
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn weights_rows_by_inverse_variance() {
        let noise = WhiteNoise::from_std(array![1.0, 2.0]).unwrap();
        let residual = array![[1.0, -2.0, 3.0], [4.0, 8.0, -4.0]];
        let weighted = noise.apply_noise(residual.view()).unwrap();
        assert_eq!(weighted, array![[1.0, -2.0, 3.0], [1.0, 2.0, -1.0]]);
    }

    #[test]
    fn estimate_uses_sample_standard_deviation() {
        let data = array![[1.0, 3.0, 5.0], [0.0, 0.0, 3.0]];
        let noise = WhiteNoise::estimate(data.view()).unwrap();
        // sample variances are 4 and 3
        assert_relative_eq!(noise.inv_var(), &array![0.25, 1.0 / 3.0], epsilon = 1e-15);
    }

    #[test]
    fn rejects_degenerate_noise() {
        assert!(matches!(
            WhiteNoise::from_std(array![1.0, 0.0]),
            Err(SamplerError::InvalidNoise(_))
        ));
        assert!(matches!(
            WhiteNoise::estimate(array![[1.0], [2.0]].view()),
            Err(SamplerError::InvalidNoise(_))
        ));
        assert!(matches!(
            WhiteNoise::estimate(array![[1.0, 1.0], [2.0, 3.0]].view()),
            Err(SamplerError::InvalidNoise(_))
        ));
    }

    #[test]
    fn rejects_wrong_detector_count() {
        let noise = WhiteNoise::from_std(array![1.0, 2.0]).unwrap();
        assert!(matches!(
            noise.apply_noise(Array2::zeros((3, 4)).view()),
            Err(SamplerError::TodShapeMismatch(_))
        ));
    }
}
