use crate::error::SamplerError;
use crate::sampler::posterior::Posterior;

use ndarray::{Array1, Array2, Array3, Axis};
use rand::prelude::*;
use rand_distr::StandardNormal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Affine-invariant ensemble MCMC over the sampled parameters
///
/// Walkers start from a start vector perturbed by `scatter * max(|x|, 1) * N(0, 1)`; perturbed
/// positions are redrawn until the posterior is finite there. The walker count must be even and
/// more than twice the number of sampled parameters. Positions pass through single precision
/// inside the ensemble driver.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EnsembleMcmc {
    pub nwalkers: usize,
    pub niterations: usize,
    pub scatter: f64,
    pub seed: u64,
    /// Log progress every this many iterations, zero disables it
    pub log_every: usize,
}

impl EnsembleMcmc {
    pub const MAX_START_ATTEMPTS: usize = 1000;

    pub fn new(nwalkers: usize, niterations: usize) -> Self {
        Self {
            nwalkers,
            niterations,
            ..Self::default()
        }
    }

    #[inline]
    pub fn default_nwalkers() -> usize {
        32
    }

    #[inline]
    pub fn default_niterations() -> usize {
        1000
    }

    #[inline]
    pub fn default_scatter() -> f64 {
        1e-3
    }

    #[inline]
    pub fn default_seed() -> u64 {
        0
    }

    #[inline]
    pub fn default_log_every() -> usize {
        100
    }

    fn check(&self, ndim: usize) -> Result<(), SamplerError> {
        if ndim == 0 {
            return Err(SamplerError::InvalidEnsemble(
                "nothing to sample, every parameter is frozen".to_string(),
            ));
        }
        if self.nwalkers % 2 != 0 || self.nwalkers <= 2 * ndim {
            return Err(SamplerError::InvalidEnsemble(format!(
                "{} walkers given, an even number greater than {} is required",
                self.nwalkers,
                2 * ndim
            )));
        }
        if !(self.scatter.is_finite() && self.scatter >= 0.0) {
            return Err(SamplerError::InvalidEnsemble(format!(
                "scatter must be non-negative, got {}",
                self.scatter
            )));
        }
        Ok(())
    }

    /// Initial walker positions around `start`, each with a finite posterior
    fn initial_walkers(
        &self,
        posterior: &Posterior,
        start: &[f64],
        rng: &mut StdRng,
    ) -> Result<Vec<Vec<f64>>, SamplerError> {
        (0..self.nwalkers)
            .map(|walker| {
                for _ in 0..Self::MAX_START_ATTEMPTS {
                    let position: Vec<f64> = start
                        .iter()
                        .map(|&x| {
                            let noise: f64 = rng.sample(StandardNormal);
                            x + self.scatter * x.abs().max(1.0) * noise
                        })
                        .collect();
                    if posterior.ln_prob(&position).is_finite() {
                        return Ok(position);
                    }
                }
                Err(SamplerError::InvalidEnsemble(format!(
                    "no finite-posterior start found for walker {walker} after {} attempts",
                    Self::MAX_START_ATTEMPTS
                )))
            })
            .collect()
    }

    /// Sample the posterior starting from the sampled-parameter vector `start`
    pub fn run(&self, posterior: &Posterior, start: &[f64]) -> Result<McmcChain, SamplerError> {
        let ndim = posterior.ndim();
        self.check(ndim)?;
        if start.len() != ndim {
            return Err(SamplerError::SampledCount {
                expected: ndim,
                actual: start.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let walkers = self.initial_walkers(posterior, start, &mut rng)?;
        let guesses: Vec<_> = walkers
            .iter()
            .map(|position| {
                let values: Vec<f32> = position.iter().map(|&x| x as f32).collect();
                emcee::Guess::new(&values)
            })
            .collect();

        tracing::info!(
            nwalkers = self.nwalkers,
            niterations = self.niterations,
            ndim,
            "starting ensemble MCMC"
        );
        let mut sampler = emcee::EnsembleSampler::new(self.nwalkers, ndim, posterior)
            .map_err(|e| SamplerError::Mcmc(e.to_string()))?;
        sampler.seed(&[self.seed as _]);

        let mut chain = Array3::zeros((self.niterations, self.nwalkers, ndim));
        let mut ln_prob = Array2::from_elem((self.niterations, self.nwalkers), f64::NEG_INFINITY);
        let mut iteration = 0;
        sampler
            .sample(&guesses, self.niterations, |step| {
                if iteration >= self.niterations {
                    return;
                }
                for (walker, guess) in step.pos.iter().enumerate() {
                    for (param, &value) in guess.values.iter().enumerate() {
                        chain[[iteration, walker, param]] = value as f64;
                    }
                }
                for (walker, &lp) in step.lnprob.iter().enumerate() {
                    ln_prob[[iteration, walker]] = lp as f64;
                }
                iteration += 1;
                if self.log_every > 0 && iteration % self.log_every == 0 {
                    tracing::info!(iteration, niterations = self.niterations, "MCMC progress");
                }
            })
            .map_err(|e| SamplerError::Mcmc(e.to_string()))?;

        let acceptance_fraction = sampler
            .acceptance_fraction()
            .into_iter()
            .map(|f| f as f64)
            .collect();
        tracing::info!(iterations = iteration, "ensemble MCMC finished");
        Ok(McmcChain {
            chain,
            ln_prob,
            acceptance_fraction,
        })
    }
}

impl Default for EnsembleMcmc {
    fn default() -> Self {
        Self {
            nwalkers: Self::default_nwalkers(),
            niterations: Self::default_niterations(),
            scatter: Self::default_scatter(),
            seed: Self::default_seed(),
            log_every: Self::default_log_every(),
        }
    }
}

/// Walker positions and log-posterior values of every iteration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct McmcChain {
    /// `(iteration, walker, parameter)`
    pub chain: Array3<f64>,
    /// `(iteration, walker)`
    pub ln_prob: Array2<f64>,
    pub acceptance_fraction: Array1<f64>,
}

impl McmcChain {
    #[inline]
    pub fn niterations(&self) -> usize {
        self.chain.len_of(Axis(0))
    }

    #[inline]
    pub fn nwalkers(&self) -> usize {
        self.chain.len_of(Axis(1))
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.chain.len_of(Axis(2))
    }

    /// Samples of shape `(nsamples, ndim)` after dropping the first `discard` iterations and
    /// keeping every `thin`-th of the rest, walkers of one iteration are adjacent
    pub fn flat_samples(&self, discard: usize, thin: usize) -> Array2<f64> {
        let thin = thin.max(1);
        let kept = self.niterations().saturating_sub(discard).div_ceil(thin);
        let nwalkers = self.nwalkers();
        Array2::from_shape_fn((kept * nwalkers, self.ndim()), |(row, param)| {
            let iteration = discard + (row / nwalkers) * thin;
            self.chain[[iteration, row % nwalkers, param]]
        })
    }

    /// Position and log-posterior of the highest-probability sample
    pub fn best(&self) -> Option<(Array1<f64>, f64)> {
        self.ln_prob
            .indexed_iter()
            .filter(|(_, lp)| !lp.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|((iteration, walker), &lp)| {
                let position = self
                    .chain
                    .index_axis(Axis(0), iteration)
                    .index_axis(Axis(0), walker)
                    .to_owned();
                (position, lp)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sampler::FrozenParameters;
    use crate::sampler::likelihood::{Likelihood, TodContext};
    use crate::sampler::noise::WhiteNoise;
    use crate::sampler::prior::{LnPrior, LnPrior1D};
    use crate::tests::*;

    use approx::assert_relative_eq;
    use ndarray::{array, s};
    use std::sync::Arc;

    fn amplitude_posterior() -> Posterior {
        let model = isobeta_model(6.0, 1.0);
        let truth = isobeta_params(2.5, 0.8, 2.0);
        let dx = Array2::from_shape_fn((2, 24), |(d, s)| 0.5 * s as f64 + d as f64);
        let dy = Array2::from_shape_fn((2, 24), |(d, s)| 11.0 - 0.4 * s as f64 + d as f64);
        let mut rng = StdRng::seed_from_u64(3);
        let data = model
            .model_tod(&truth, dx.view(), dy.view())
            .unwrap()
            .mapv(|v| v + 0.05 * rng.sample::<f64, _>(StandardNormal));
        let noise = Arc::new(WhiteNoise::from_std(array![0.05, 0.05]).unwrap());
        let tod = TodContext::new(dx, dy, data, noise).unwrap();
        let frozen = FrozenParameters::new(
            (0..8).collect(),
            truth[..8].to_vec(),
            truth.len(),
        )
        .unwrap();
        let likelihood = Likelihood::new(model, vec![tod], frozen).unwrap();
        let prior = LnPrior::ind_components(vec![LnPrior1D::uniform(0.0, 10.0).unwrap()]);
        Posterior::new(likelihood, prior).unwrap()
    }

    #[test]
    fn rejects_invalid_ensembles() {
        let posterior = amplitude_posterior();
        // odd, and not more than twice the single sampled dimension
        for nwalkers in [0, 2, 3] {
            assert!(matches!(
                EnsembleMcmc::new(nwalkers, 10).run(&posterior, &[2.0]),
                Err(SamplerError::InvalidEnsemble(_))
            ));
        }
        assert_eq!(
            EnsembleMcmc::new(4, 10).run(&posterior, &[2.0, 1.0]),
            Err(SamplerError::SampledCount {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn start_outside_prior_support_is_reported() {
        let posterior = amplitude_posterior();
        let mcmc = EnsembleMcmc {
            scatter: 0.0,
            ..EnsembleMcmc::new(4, 10)
        };
        assert!(matches!(
            mcmc.run(&posterior, &[20.0]),
            Err(SamplerError::InvalidEnsemble(_))
        ));
    }

    #[test]
    fn smoke_run_stays_in_support() {
        let posterior = amplitude_posterior();
        let mcmc = EnsembleMcmc {
            nwalkers: 8,
            niterations: 40,
            scatter: 0.05,
            seed: 11,
            log_every: 10,
        };
        let chain = mcmc.run(&posterior, &[1.9]).unwrap();
        assert_eq!(chain.chain.dim(), (40, 8, 1));
        assert_eq!(chain.ln_prob.dim(), (40, 8));
        assert!(chain.ln_prob.iter().all(|lp| lp.is_finite()));
        assert!(chain.chain.iter().all(|&a| (0.0..=10.0).contains(&a)));

        let (best, best_lp) = chain.best().unwrap();
        assert_eq!(best.len(), 1);
        assert!(chain.ln_prob.iter().all(|&lp| lp <= best_lp));
        assert_relative_eq!(best[0], 2.0, max_relative = 0.2);
    }

    #[test]
    fn flat_samples_discard_and_thin() {
        let chain = Array3::from_shape_fn((5, 2, 1), |(i, w, _)| (10 * i + w) as f64);
        let mcmc_chain = McmcChain {
            ln_prob: Array2::zeros((5, 2)),
            chain,
            acceptance_fraction: Array1::zeros(2),
        };
        let flat = mcmc_chain.flat_samples(1, 2);
        assert_eq!(flat.column(0), array![10.0, 11.0, 30.0, 31.0].view());
        assert_eq!(mcmc_chain.flat_samples(0, 0).slice(s![.., 0]).len(), 10);
        assert_eq!(mcmc_chain.flat_samples(7, 1).nrows(), 0);
    }

    #[test]
    fn chain_serializes() {
        let chain = McmcChain {
            chain: Array3::ones((2, 2, 1)),
            ln_prob: Array2::zeros((2, 2)),
            acceptance_fraction: array![0.5, 0.25],
        };
        let json = serde_json::to_string(&chain).unwrap();
        let back: McmcChain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chain);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let mcmc: EnsembleMcmc = serde_json::from_str(r#"{"nwalkers": 16}"#).unwrap();
        assert_eq!(
            mcmc,
            EnsembleMcmc {
                nwalkers: 16,
                ..EnsembleMcmc::default()
            }
        );
    }
}
