use crate::error::SamplerError;
use crate::sampler::likelihood::Likelihood;
use crate::sampler::prior::LnPrior;

use ndarray::Array1;

/// Log-posterior of the sampled parameters
#[derive(Clone, Debug)]
pub struct Posterior {
    likelihood: Likelihood,
    prior: LnPrior,
}

impl Posterior {
    /// The prior must cover exactly the sampled parameters unless it accepts any length
    pub fn new(likelihood: Likelihood, prior: LnPrior) -> Result<Self, SamplerError> {
        if let Some(actual) = prior.len() {
            let expected = likelihood.n_sampled();
            if actual != expected {
                return Err(SamplerError::PriorLength { expected, actual });
            }
        }
        Ok(Self { likelihood, prior })
    }

    #[inline]
    pub fn likelihood(&self) -> &Likelihood {
        &self.likelihood
    }

    #[inline]
    pub fn prior(&self) -> &LnPrior {
        &self.prior
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.likelihood.n_sampled()
    }

    /// `ln_prior + ln_likelihood`, negative infinity when either is not finite
    ///
    /// The likelihood is not evaluated outside of the prior support.
    pub fn try_ln_prob(&self, sampled: &[f64]) -> Result<f64, SamplerError> {
        self.check_len(sampled)?;
        let ln_prior = self.prior.ln_prior(sampled, None);
        if !ln_prior.is_finite() {
            return Ok(f64::NEG_INFINITY);
        }
        let ln_like = self.likelihood.ln_likelihood(sampled)?;
        if !ln_like.is_finite() {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(ln_prior + ln_like)
    }

    /// Like [`Posterior::try_ln_prob`], evaluation errors are logged and give negative infinity
    pub fn ln_prob(&self, sampled: &[f64]) -> f64 {
        self.try_ln_prob(sampled).unwrap_or_else(|error| {
            tracing::warn!(%error, "posterior evaluation failed");
            f64::NEG_INFINITY
        })
    }

    /// Log-posterior and its gradient over the sampled parameters
    ///
    /// Outside of the prior support, or where the likelihood is not finite, the value is negative
    /// infinity and the gradient is zero.
    pub fn ln_prob_and_grad(&self, sampled: &[f64]) -> Result<(f64, Array1<f64>), SamplerError> {
        self.check_len(sampled)?;
        let mut grad = Array1::zeros(sampled.len());
        let ln_prior = match grad.as_slice_mut() {
            Some(jac) => self.prior.ln_prior(sampled, Some(jac)),
            None => self.prior.ln_prior(sampled, None),
        };
        if !ln_prior.is_finite() {
            return Ok((f64::NEG_INFINITY, Array1::zeros(sampled.len())));
        }
        let (ln_like, like_grad) = self.likelihood.ln_likelihood_and_grad(sampled)?;
        if !ln_like.is_finite() {
            return Ok((f64::NEG_INFINITY, Array1::zeros(sampled.len())));
        }
        Ok((ln_prior + ln_like, grad + like_grad))
    }

    fn check_len(&self, sampled: &[f64]) -> Result<(), SamplerError> {
        if sampled.len() == self.ndim() {
            Ok(())
        } else {
            Err(SamplerError::SampledCount {
                expected: self.ndim(),
                actual: sampled.len(),
            })
        }
    }
}

fn guess_to_f64(guess: &emcee::Guess) -> Vec<f64> {
    guess.values.iter().map(|&v| v as f64).collect()
}

impl emcee::Prob for Posterior {
    fn lnlike(&self, params: &emcee::Guess) -> f32 {
        let sampled = guess_to_f64(params);
        match self.likelihood.ln_likelihood(&sampled) {
            Ok(ln_like) if ln_like.is_finite() => ln_like as f32,
            Ok(_) => f32::NEG_INFINITY,
            Err(error) => {
                tracing::warn!(%error, "likelihood evaluation failed");
                f32::NEG_INFINITY
            }
        }
    }

    fn lnprior(&self, params: &emcee::Guess) -> f32 {
        let sampled = guess_to_f64(params);
        if sampled.len() != self.ndim() {
            return f32::NEG_INFINITY;
        }
        self.prior.ln_prior(&sampled, None) as f32
    }
}
