//! Posterior sampling of model parameters against time-ordered data
//!
//! The model is evaluated at a full parameter vector assembled from the sampled parameters and a
//! fixed set of frozen ones. Data enter through [`TodContext`], each carrying its own
//! [`NoiseModel`]; [`Posterior`] combines the [`Likelihood`] with an [`LnPrior`] and is driven by
//! [`EnsembleMcmc`].

pub mod likelihood;
pub mod mcmc;
pub mod noise;
pub mod posterior;
pub mod prior;

pub use likelihood::{Likelihood, TodContext};
pub use mcmc::{EnsembleMcmc, McmcChain};
pub use noise::{NoiseModel, WhiteNoise};
pub use posterior::Posterior;
pub use prior::{LnPrior, LnPrior1D, LnPrior1DTrait};

use crate::error::SamplerError;

/// Parameters kept fixed while the rest are sampled
#[derive(Clone, Debug, PartialEq)]
pub struct FrozenParameters {
    nparams: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
    sampled: Vec<usize>,
}

impl FrozenParameters {
    /// Freeze `values[i]` at full-vector index `indices[i]`
    pub fn new(
        indices: Vec<usize>,
        values: Vec<f64>,
        nparams: usize,
    ) -> Result<Self, SamplerError> {
        if indices.len() != values.len() {
            return Err(SamplerError::FrozenValuesLength {
                indices: indices.len(),
                values: values.len(),
            });
        }
        let mut is_frozen = vec![false; nparams];
        for &index in &indices {
            match is_frozen.get_mut(index) {
                None => return Err(SamplerError::FrozenIndexOutOfRange { index, nparams }),
                Some(true) => return Err(SamplerError::DuplicateFrozenIndex(index)),
                Some(flag) => *flag = true,
            }
        }
        let sampled = (0..nparams).filter(|&i| !is_frozen[i]).collect();
        Ok(Self {
            nparams,
            indices,
            values,
            sampled,
        })
    }

    /// Nothing is frozen, every parameter is sampled
    pub fn none(nparams: usize) -> Self {
        Self {
            nparams,
            indices: vec![],
            values: vec![],
            sampled: (0..nparams).collect(),
        }
    }

    #[inline]
    pub fn nparams(&self) -> usize {
        self.nparams
    }

    #[inline]
    pub fn n_sampled(&self) -> usize {
        self.sampled.len()
    }

    /// Full-vector indices of sampled parameters, ascending
    #[inline]
    pub fn sampled_indices(&self) -> &[usize] {
        &self.sampled
    }

    /// Full parameter vector: frozen values at their indices, sampled values filling the rest in
    /// ascending index order
    pub fn assemble(&self, sampled: &[f64]) -> Result<Vec<f64>, SamplerError> {
        if sampled.len() != self.n_sampled() {
            return Err(SamplerError::SampledCount {
                expected: self.n_sampled(),
                actual: sampled.len(),
            });
        }
        let mut full = vec![0.0; self.nparams];
        for (&index, &value) in self.indices.iter().zip(&self.values) {
            full[index] = value;
        }
        for (&index, &value) in self.sampled.iter().zip(sampled) {
            full[index] = value;
        }
        Ok(full)
    }

    /// Sampled part of a full parameter vector
    pub fn split(&self, full: &[f64]) -> Result<Vec<f64>, SamplerError> {
        if full.len() != self.nparams {
            return Err(SamplerError::SampledCount {
                expected: self.nparams,
                actual: full.len(),
            });
        }
        Ok(self.sampled.iter().map(|&i| full[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_puts_sampled_values_in_ascending_gaps() {
        let frozen = FrozenParameters::new(vec![3, 0], vec![30.0, 0.5], 5).unwrap();
        assert_eq!(frozen.sampled_indices(), [1, 2, 4]);
        assert_eq!(frozen.n_sampled(), 3);
        let full = frozen.assemble(&[1.0, 2.0, 4.0]).unwrap();
        assert_eq!(full, [0.5, 1.0, 2.0, 30.0, 4.0]);
        assert_eq!(frozen.split(&full).unwrap(), [1.0, 2.0, 4.0]);
    }

    #[test]
    fn none_samples_everything() {
        let frozen = FrozenParameters::none(3);
        assert_eq!(frozen.assemble(&[1.0, 2.0, 3.0]).unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn invalid_frozen_sets_are_rejected() {
        assert_eq!(
            FrozenParameters::new(vec![1, 5], vec![0.0, 0.0], 5),
            Err(SamplerError::FrozenIndexOutOfRange {
                index: 5,
                nparams: 5
            })
        );
        assert_eq!(
            FrozenParameters::new(vec![2, 2], vec![0.0, 1.0], 5),
            Err(SamplerError::DuplicateFrozenIndex(2))
        );
        assert_eq!(
            FrozenParameters::new(vec![2], vec![], 5),
            Err(SamplerError::FrozenValuesLength {
                indices: 1,
                values: 0
            })
        );
    }

    #[test]
    fn wrong_sampled_length_is_an_error() {
        let frozen = FrozenParameters::new(vec![0], vec![1.0], 3).unwrap();
        assert_eq!(
            frozen.assemble(&[1.0]),
            Err(SamplerError::SampledCount {
                expected: 2,
                actual: 1
            })
        );
    }
}
