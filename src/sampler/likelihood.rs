use crate::error::SamplerError;
use crate::grad::Argnums;
use crate::interp::bilinear;
use crate::model::Model;
use crate::sampler::FrozenParameters;
use crate::sampler::noise::NoiseModel;

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, Zip};
use rayon::prelude::*;
use std::sync::Arc;

/// One time-ordered dataset: pointing in map pixel units, detector samples and their noise
#[derive(Clone, Debug)]
pub struct TodContext {
    dx: Array2<f64>,
    dy: Array2<f64>,
    data: Array2<f64>,
    noise: Arc<dyn NoiseModel>,
}

impl TodContext {
    /// Arrays are `(ndet, nsamp)` and must share one shape the noise model accepts
    pub fn new(
        dx: Array2<f64>,
        dy: Array2<f64>,
        data: Array2<f64>,
        noise: Arc<dyn NoiseModel>,
    ) -> Result<Self, SamplerError> {
        if dx.dim() != dy.dim() || dx.dim() != data.dim() {
            return Err(SamplerError::TodShapeMismatch(format!(
                "dx {:?}, dy {:?}, data {:?}",
                dx.dim(),
                dy.dim(),
                data.dim()
            )));
        }
        noise.check_shape(data.dim())?;
        Ok(Self {
            dx,
            dy,
            data,
            noise,
        })
    }

    #[inline]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    #[inline]
    pub fn noise(&self) -> &dyn NoiseModel {
        self.noise.as_ref()
    }

    /// Residual `data - model` and its whitened version `N⁻¹ r`
    fn residuals(
        &self,
        map: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>), SamplerError> {
        let prediction = bilinear(map, self.dx.view(), self.dy.view())?;
        let residual = &self.data - &prediction;
        let weighted = self.noise.apply_noise(residual.view())?;
        Ok((residual, weighted))
    }

    fn ln_likelihood(&self, map: ArrayView2<f64>) -> Result<f64, SamplerError> {
        let (residual, weighted) = self.residuals(map)?;
        Ok(-0.5 * dot(&residual, &weighted))
    }

    /// Log-likelihood and its gradient over the rows of `map_grad`
    fn ln_likelihood_and_grad(
        &self,
        map: ArrayView2<f64>,
        map_grad: &Array3<f64>,
        rows: &[usize],
    ) -> Result<(f64, Array1<f64>), SamplerError> {
        let (residual, weighted) = self.residuals(map)?;
        let ln_like = -0.5 * dot(&residual, &weighted);
        let grad = rows
            .iter()
            .map(|&row| {
                let tangent = bilinear(
                    map_grad.index_axis(Axis(0), row),
                    self.dx.view(),
                    self.dy.view(),
                )?;
                Ok(dot(&weighted, &tangent))
            })
            .collect::<Result<Array1<f64>, SamplerError>>()?;
        Ok((ln_like, grad))
    }
}

fn dot(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    Zip::from(a).and(b).fold(0.0, |acc, x, y| acc + x * y)
}

/// Gaussian log-likelihood of all TODs given the sampled parameters
///
/// `ln L = -½ Σ r · N⁻¹ r` with `r = data - model_tod`, summed over TODs in parallel. The model
/// map is computed once per evaluation and shared by every TOD.
#[derive(Clone, Debug)]
pub struct Likelihood {
    model: Model,
    tods: Vec<TodContext>,
    frozen: FrozenParameters,
}

impl Likelihood {
    pub fn new(
        model: Model,
        tods: Vec<TodContext>,
        frozen: FrozenParameters,
    ) -> Result<Self, SamplerError> {
        if frozen.nparams() != model.nparams() {
            return Err(SamplerError::SampledCount {
                expected: model.nparams(),
                actual: frozen.nparams(),
            });
        }
        tracing::debug!(
            ntods = tods.len(),
            nsampled = frozen.n_sampled(),
            "likelihood constructed"
        );
        Ok(Self {
            model,
            tods,
            frozen,
        })
    }

    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[inline]
    pub fn tods(&self) -> &[TodContext] {
        &self.tods
    }

    #[inline]
    pub fn frozen(&self) -> &FrozenParameters {
        &self.frozen
    }

    #[inline]
    pub fn n_sampled(&self) -> usize {
        self.frozen.n_sampled()
    }

    pub fn ln_likelihood(&self, sampled: &[f64]) -> Result<f64, SamplerError> {
        let params = self.frozen.assemble(sampled)?;
        let map = self.model.model(&params)?;
        self.tods
            .par_iter()
            .map(|tod| tod.ln_likelihood(map.view()))
            .sum()
    }

    /// Log-likelihood and `∂lnL/∂θ` over the sampled parameters
    pub fn ln_likelihood_and_grad(
        &self,
        sampled: &[f64],
    ) -> Result<(f64, Array1<f64>), SamplerError> {
        let params = self.frozen.assemble(sampled)?;
        let rows = self.frozen.sampled_indices();
        let argnums = Argnums::new(rows.iter().copied(), self.model.nparams())?;
        let (map, map_grad) = self.model.model_grad(&params, &argnums)?;
        let per_tod = self
            .tods
            .par_iter()
            .map(|tod| tod.ln_likelihood_and_grad(map.view(), &map_grad, rows))
            .collect::<Result<Vec<_>, SamplerError>>()?;
        Ok(per_tod.into_iter().fold(
            (0.0, Array1::zeros(rows.len())),
            |(ln_like, grad), (tod_ln_like, tod_grad)| (ln_like + tod_ln_like, grad + tod_grad),
        ))
    }
}
