use crate::sampler::prior::ln_prior_1d::{LnPrior1D, LnPrior1DTrait};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Natural logarithm of prior over the sampled parameters
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum LnPrior {
    None(NoneLnPrior),
    IndComponents(IndComponentsLnPrior),
}

impl LnPrior {
    pub fn none() -> Self {
        Self::None(NoneLnPrior {})
    }

    pub fn ind_components(components: Vec<LnPrior1D>) -> Self {
        Self::IndComponents(IndComponentsLnPrior { components })
    }

    /// Number of parameters the prior is defined for, `None` if it accepts any length
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::None(_) => None,
            Self::IndComponents(p) => Some(p.components.len()),
        }
    }

    /// Evaluate the natural logarithm of the prior at params
    ///
    /// If `jac` is `Some`, d(ln_prior)/d(params) is written into it, it must be as long as
    /// `params`.
    pub fn ln_prior(&self, params: &[f64], jac: Option<&mut [f64]>) -> f64 {
        match self {
            Self::None(_) => {
                if let Some(j) = jac {
                    j.fill(0.0);
                }
                0.0
            }
            Self::IndComponents(p) => p.ln_prior(params, jac),
        }
    }
}

impl Default for LnPrior {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NoneLnPrior {}

/// Independent one-dimensional priors, one per sampled parameter
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct IndComponentsLnPrior {
    pub components: Vec<LnPrior1D>,
}

impl IndComponentsLnPrior {
    fn ln_prior(&self, params: &[f64], jac: Option<&mut [f64]>) -> f64 {
        let mut total_ln_prior = 0.0;

        if let Some(j) = jac {
            for ((&x, ln_prior), j) in params.iter().zip(&self.components).zip(j.iter_mut()) {
                let mut grad = 0.0;
                total_ln_prior += ln_prior.ln_prior_1d(x, Some(&mut grad));
                *j = grad;
            }
        } else {
            for (&x, ln_prior) in params.iter().zip(&self.components) {
                total_ln_prior += ln_prior.ln_prior_1d(x, None);
            }
        }

        total_ln_prior
    }
}
