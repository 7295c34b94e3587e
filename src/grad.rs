//! Forward-mode derivatives of the model with respect to selected parameters
//!
//! Every selected parameter gets its own dual-number pass through the whole pipeline; passes are
//! independent and run in parallel. Rows of the gradient that are not selected are exactly zero.

use crate::error::ModelError;
use crate::float_trait::{LikeFloat, seed_direction};
use crate::interp::{bilinear, check_coordinates};
use crate::model::Model;

use ndarray::{Array, Array2, Array3, ArrayView, Axis, Dimension};
use rayon::prelude::*;

/// Leading non-parameter arguments of the map-level model signature
pub const MODEL_LEADING_ARGS: [&str; 12] = [
    "xyz",
    "n_isobeta",
    "n_gnfw",
    "n_a10",
    "n_gaussian",
    "n_egaussian",
    "n_uniform",
    "n_exponential",
    "n_powerlaw",
    "n_powerlaw_cos",
    "dz",
    "beam",
];

/// Leading non-parameter arguments of the timestream-level model signature
pub const MODEL_TOD_LEADING_ARGS: [&str; 14] = [
    "xyz",
    "n_isobeta",
    "n_gnfw",
    "n_a10",
    "n_gaussian",
    "n_egaussian",
    "n_uniform",
    "n_exponential",
    "n_powerlaw",
    "n_powerlaw_cos",
    "dz",
    "beam",
    "dx",
    "dy",
];

/// Offset between signature-numbered argnums and parameter indices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgnumShift(usize);

impl ArgnumShift {
    pub const MODEL: Self = Self(MODEL_LEADING_ARGS.len());
    pub const MODEL_TOD: Self = Self(MODEL_TOD_LEADING_ARGS.len());

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Validated, sorted and de-duplicated parameter indices to differentiate with respect to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argnums(Vec<usize>);

impl Argnums {
    /// Parameter indices, each must be below `nparams`
    pub fn new(
        indices: impl IntoIterator<Item = usize>,
        nparams: usize,
    ) -> Result<Self, ModelError> {
        let mut indices: Vec<_> = indices.into_iter().collect();
        if let Some(&index) = indices.iter().find(|&&i| i >= nparams) {
            return Err(ModelError::ArgnumOutOfRange { index, nparams });
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(Self(indices))
    }

    /// Every parameter
    pub fn all(nparams: usize) -> Self {
        Self((0..nparams).collect())
    }

    /// Convert argnums numbered over a full model signature into parameter indices
    pub fn from_signature(
        shift: ArgnumShift,
        argnums: impl IntoIterator<Item = usize>,
        nparams: usize,
    ) -> Result<Self, ModelError> {
        let shift = shift.get();
        let indices = argnums
            .into_iter()
            .map(|argnum| {
                argnum
                    .checked_sub(shift)
                    .ok_or(ModelError::ArgnumBeforeParameters { argnum, shift })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(indices, nparams)
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn check(&self, nparams: usize) -> Result<(), ModelError> {
        match self.0.last() {
            Some(&index) if index >= nparams => {
                Err(ModelError::ArgnumOutOfRange { index, nparams })
            }
            _ => Ok(()),
        }
    }
}

impl Model {
    /// Model map and its gradient of shape `(nparams, nx, ny)`
    pub fn model_grad(
        &self,
        params: &[f64],
        argnums: &Argnums,
    ) -> Result<(Array2<f64>, Array3<f64>), ModelError> {
        self.layout().check_len(params.len())?;
        argnums.check(self.nparams())?;
        let prediction = self.evaluate_map(params);
        let (nx, ny) = prediction.dim();
        let mut gradient = Array3::zeros((self.nparams(), nx, ny));
        for (index, row) in self.tangent_maps(params, argnums) {
            gradient.index_axis_mut(Axis(0), index).assign(&row);
        }
        Ok((prediction, gradient))
    }

    /// Timestream prediction and its gradient of shape `(nparams, *dx.shape())`
    #[allow(clippy::type_complexity)]
    pub fn model_tod_grad<D: Dimension>(
        &self,
        params: &[f64],
        dx: ArrayView<f64, D>,
        dy: ArrayView<f64, D>,
        argnums: &Argnums,
    ) -> Result<(Array<f64, D>, Array<f64, D::Larger>), ModelError> {
        check_coordinates(&dx, &dy)?;
        self.layout().check_len(params.len())?;
        argnums.check(self.nparams())?;
        let map = self.evaluate_map(params);
        let prediction = bilinear(map.view(), dx.view(), dy.view())?;

        let mut shape = D::Larger::zeros(dx.ndim() + 1);
        shape[0] = self.nparams();
        shape.slice_mut()[1..].copy_from_slice(dx.shape());
        let mut gradient = Array::zeros(shape);
        for (index, tangent_map) in self.tangent_maps(params, argnums) {
            let row = bilinear(tangent_map.view(), dx.view(), dy.view())?;
            gradient.index_axis_mut(Axis(0), index).assign(&row);
        }
        Ok((prediction, gradient))
    }

    /// Tangent maps `∂map/∂θ_i` of every selected parameter, one parallel dual pass each
    fn tangent_maps(&self, params: &[f64], argnums: &Argnums) -> Vec<(usize, Array2<f64>)> {
        tracing::debug!(passes = argnums.len(), "forward-mode gradient");
        argnums
            .as_slice()
            .par_iter()
            .map(|&index| {
                let seeded = seed_direction(params, index);
                let map = self.evaluate_map(&seeded);
                (index, map.mapv(LikeFloat::tangent))
            })
            .collect()
    }
}
