use crate::error::PriorError;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[enum_dispatch]
pub trait LnPrior1DTrait: Clone + Debug + Serialize + DeserializeOwned + PartialEq {
    /// Evaluate the natural logarithm of the prior at x
    ///
    /// If `grad` is `Some`, the derivative d(ln_prior)/dx is also computed and stored in it.
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64;
}

/// Natural logarithm of prior for a single sampled parameter
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum LnPrior1D {
    None(NoneLnPrior1D),
    LogNormal(LogNormalLnPrior1D),
    LogUniform(LogUniformLnPrior1D),
    Normal(NormalLnPrior1D),
    Uniform(UniformLnPrior1D),
    Mix(MixLnPrior1D),
}

impl LnPrior1D {
    pub fn none() -> Self {
        NoneLnPrior1D {}.into()
    }

    pub fn log_normal(mu: f64, std: f64) -> Result<Self, PriorError> {
        Ok(LogNormalLnPrior1D::new(mu, std)?.into())
    }

    pub fn log_uniform(left: f64, right: f64) -> Result<Self, PriorError> {
        Ok(LogUniformLnPrior1D::new(left, right)?.into())
    }

    pub fn normal(mu: f64, std: f64) -> Result<Self, PriorError> {
        Ok(NormalLnPrior1D::new(mu, std)?.into())
    }

    pub fn uniform(left: f64, right: f64) -> Result<Self, PriorError> {
        Ok(UniformLnPrior1D::new(left, right)?.into())
    }

    pub fn mix(weight_prior_pairs: &[(f64, LnPrior1D)]) -> Result<Self, PriorError> {
        Ok(MixLnPrior1D::new(weight_prior_pairs)?.into())
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, PriorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PriorError::NotFinite { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, PriorError> {
    if finite(name, value)? > 0.0 {
        Ok(value)
    } else {
        Err(PriorError::NotPositive { name, value })
    }
}

fn ordered(left: f64, right: f64) -> Result<(), PriorError> {
    if left < right {
        Ok(())
    } else {
        Err(PriorError::EmptyRange { left, right })
    }
}

/// Gaussian normalisation `-ln(std) - ln(2π) / 2`
fn gaussian_ln_coeff(std: f64) -> f64 {
    -f64::ln(std) - 0.5 * f64::ln(std::f64::consts::TAU)
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NoneLnPrior1D {}

impl LnPrior1DTrait for NoneLnPrior1D {
    fn ln_prior_1d(&self, _x: f64, grad: Option<&mut f64>) -> f64 {
        if let Some(g) = grad {
            *g = 0.0;
        }
        0.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(
    into = "LogNormalLnPrior1DParameters",
    try_from = "LogNormalLnPrior1DParameters"
)]
pub struct LogNormalLnPrior1D {
    mu: f64,
    inv_std2: f64,
    ln_prob_coeff: f64,
}

impl LogNormalLnPrior1D {
    pub fn new(mu: f64, std: f64) -> Result<Self, PriorError> {
        let mu = finite("mu", mu)?;
        let std = positive("std", std)?;
        Ok(Self {
            mu,
            inv_std2: std.powi(-2),
            ln_prob_coeff: gaussian_ln_coeff(std),
        })
    }
}

impl LnPrior1DTrait for LogNormalLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        if !(x > 0.0) {
            if let Some(g) = grad {
                *g = 0.0;
            }
            return f64::NEG_INFINITY;
        }
        let ln_x = f64::ln(x);
        let diff = self.mu - ln_x;
        let ln_prior = self.ln_prob_coeff - 0.5 * diff.powi(2) * self.inv_std2 - ln_x;

        if let Some(g) = grad {
            *g = (diff * self.inv_std2 - 1.0) / x;
        }

        ln_prior
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "LogNormalLnPrior1D")]
struct LogNormalLnPrior1DParameters {
    mu: f64,
    std: f64,
}

impl From<LogNormalLnPrior1D> for LogNormalLnPrior1DParameters {
    fn from(f: LogNormalLnPrior1D) -> Self {
        Self {
            mu: f.mu,
            std: f.inv_std2.recip().sqrt(),
        }
    }
}

impl TryFrom<LogNormalLnPrior1DParameters> for LogNormalLnPrior1D {
    type Error = PriorError;

    fn try_from(f: LogNormalLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::new(f.mu, f.std)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(
    into = "LogUniformLnPrior1DParameters",
    try_from = "LogUniformLnPrior1DParameters"
)]
pub struct LogUniformLnPrior1D {
    ln_left: f64,
    ln_right: f64,
    ln_prob_coeff: f64,
}

impl LogUniformLnPrior1D {
    pub fn new(left: f64, right: f64) -> Result<Self, PriorError> {
        let left = positive("left", left)?;
        let right = positive("right", right)?;
        ordered(left, right)?;
        let (ln_left, ln_right) = (f64::ln(left), f64::ln(right));
        Ok(Self {
            ln_left,
            ln_right,
            ln_prob_coeff: -f64::ln(ln_right - ln_left),
        })
    }
}

impl LnPrior1DTrait for LogUniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        let ln_x = f64::ln(x);
        if (self.ln_left..=self.ln_right).contains(&ln_x) {
            if let Some(g) = grad {
                *g = -1.0 / x;
            }
            self.ln_prob_coeff - ln_x
        } else {
            if let Some(g) = grad {
                *g = 0.0;
            }
            f64::NEG_INFINITY
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "LogUniformLnPrior1D")]
struct LogUniformLnPrior1DParameters {
    ln_range: std::ops::RangeInclusive<f64>,
}

impl From<LogUniformLnPrior1D> for LogUniformLnPrior1DParameters {
    fn from(f: LogUniformLnPrior1D) -> Self {
        Self {
            ln_range: f.ln_left..=f.ln_right,
        }
    }
}

impl TryFrom<LogUniformLnPrior1DParameters> for LogUniformLnPrior1D {
    type Error = PriorError;

    fn try_from(f: LogUniformLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::new(f.ln_range.start().exp(), f.ln_range.end().exp())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(
    into = "NormalLnPrior1DParameters",
    try_from = "NormalLnPrior1DParameters"
)]
pub struct NormalLnPrior1D {
    mu: f64,
    inv_std2: f64,
    ln_prob_coeff: f64,
}

impl NormalLnPrior1D {
    pub fn new(mu: f64, std: f64) -> Result<Self, PriorError> {
        let mu = finite("mu", mu)?;
        let std = positive("std", std)?;
        Ok(Self {
            mu,
            inv_std2: std.powi(-2),
            ln_prob_coeff: gaussian_ln_coeff(std),
        })
    }
}

impl LnPrior1DTrait for NormalLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        let diff = self.mu - x;
        let ln_prior = self.ln_prob_coeff - 0.5 * diff.powi(2) * self.inv_std2;

        if let Some(g) = grad {
            *g = diff * self.inv_std2;
        }

        ln_prior
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "NormalLnPrior1D")]
struct NormalLnPrior1DParameters {
    mu: f64,
    std: f64,
}

impl From<NormalLnPrior1D> for NormalLnPrior1DParameters {
    fn from(f: NormalLnPrior1D) -> Self {
        Self {
            mu: f.mu,
            std: f.inv_std2.recip().sqrt(),
        }
    }
}

impl TryFrom<NormalLnPrior1DParameters> for NormalLnPrior1D {
    type Error = PriorError;

    fn try_from(f: NormalLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::new(f.mu, f.std)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(
    into = "UniformLnPrior1DParameters",
    try_from = "UniformLnPrior1DParameters"
)]
pub struct UniformLnPrior1D {
    left: f64,
    right: f64,
    ln_prob: f64,
}

impl UniformLnPrior1D {
    pub fn new(left: f64, right: f64) -> Result<Self, PriorError> {
        let left = finite("left", left)?;
        let right = finite("right", right)?;
        ordered(left, right)?;
        Ok(Self {
            left,
            right,
            ln_prob: -f64::ln(right - left),
        })
    }
}

impl LnPrior1DTrait for UniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        // constant inside, so the derivative is zero everywhere it is defined
        if let Some(g) = grad {
            *g = 0.0;
        }
        if (self.left..=self.right).contains(&x) {
            self.ln_prob
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "UniformLnPrior1D")]
struct UniformLnPrior1DParameters {
    range: std::ops::RangeInclusive<f64>,
}

impl From<UniformLnPrior1D> for UniformLnPrior1DParameters {
    fn from(f: UniformLnPrior1D) -> Self {
        Self {
            range: f.left..=f.right,
        }
    }
}

impl TryFrom<UniformLnPrior1DParameters> for UniformLnPrior1D {
    type Error = PriorError;

    fn try_from(f: UniformLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::new(*f.range.start(), *f.range.end())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(into = "MixLnPrior1DParameters", try_from = "MixLnPrior1DParameters")]
pub struct MixLnPrior1D {
    mix: Vec<(f64, LnPrior1D)>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "MixLnPrior1D")]
struct MixLnPrior1DParameters {
    mix: Vec<(f64, LnPrior1D)>,
}

impl From<MixLnPrior1D> for MixLnPrior1DParameters {
    fn from(f: MixLnPrior1D) -> Self {
        Self { mix: f.mix }
    }
}

impl TryFrom<MixLnPrior1DParameters> for MixLnPrior1D {
    type Error = PriorError;

    fn try_from(f: MixLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::new(&f.mix)
    }
}

impl MixLnPrior1D {
    /// Mixture of priors from pairs of a positive weight and a component, weights are normalised
    pub fn new(weight_prior_pairs: &[(f64, LnPrior1D)]) -> Result<Self, PriorError> {
        if weight_prior_pairs.is_empty() {
            return Err(PriorError::EmptyMixture);
        }
        for &(weight, _) in weight_prior_pairs {
            positive("weight", weight)?;
        }
        let total_weight: f64 = weight_prior_pairs.iter().map(|(weight, _)| *weight).sum();
        let mix = weight_prior_pairs
            .iter()
            .map(|(weight, prior)| (*weight / total_weight, prior.clone()))
            .collect();
        Ok(Self { mix })
    }
}

impl LnPrior1DTrait for MixLnPrior1D {
    fn ln_prior_1d(&self, x: f64, grad: Option<&mut f64>) -> f64 {
        let mut total_prob = 0.0;
        let mut total_grad_weighted = 0.0;

        for (weight, prior) in &self.mix {
            let mut component_grad = 0.0;
            let ln_prob_i = prior.ln_prior_1d(
                x,
                if grad.is_some() {
                    Some(&mut component_grad)
                } else {
                    None
                },
            );
            let weighted_prob = weight * f64::exp(ln_prob_i);
            total_prob += weighted_prob;
            if grad.is_some() && weighted_prob > 0.0 {
                total_grad_weighted += weighted_prob * component_grad;
            }
        }

        if let Some(g) = grad {
            *g = if total_prob > 0.0 {
                total_grad_weighted / total_prob
            } else {
                0.0
            };
        }

        f64::ln(total_prob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use hyperdual::Hyperdual;

    fn ln_prior_normal<T: num_traits::Float>(x: T, mu: f64, std: f64) -> T {
        let mu_t = T::from(mu).unwrap();
        let std_t = T::from(std).unwrap();
        let diff = mu_t - x;
        let inv_std2 = T::one() / (std_t * std_t);
        let ln_prob_coeff =
            -T::ln(std_t) - T::from(0.5).unwrap() * T::ln(T::from(std::f64::consts::TAU).unwrap());
        ln_prob_coeff - T::from(0.5).unwrap() * diff * diff * inv_std2
    }

    fn ln_prior_log_normal<T: num_traits::Float>(x: T, mu: f64, std: f64) -> T {
        let ln_x = T::ln(x);
        ln_prior_normal(ln_x, mu, std) - ln_x
    }

    fn ln_prior_log_uniform<T: num_traits::Float>(x: T, left: f64, right: f64) -> T {
        let ln_x = T::ln(x);
        -T::from(f64::ln(right.ln() - left.ln())).unwrap() - ln_x
    }

    fn check_gradient<F, P>(f: F, test_values: &[f64], prior: P)
    where
        F: Fn(Hyperdual<f64, 2>) -> Hyperdual<f64, 2>,
        P: LnPrior1DTrait,
    {
        for &x in test_values {
            let mut actual_grad = 0.0;
            let actual_ln_p = prior.ln_prior_1d(x, Some(&mut actual_grad));
            assert!(actual_ln_p.is_finite());

            let mut x_dual = Hyperdual::<f64, 2>::from_real(x);
            x_dual[1] = 1.0;
            let ln_p_dual = f(x_dual);
            assert_relative_eq!(actual_ln_p, ln_p_dual[0], epsilon = 1e-12);
            assert_relative_eq!(actual_grad, ln_p_dual[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn normal_gradient() {
        let prior = NormalLnPrior1D::new(5.0, 2.0).unwrap();
        check_gradient(
            |x| ln_prior_normal(x, 5.0, 2.0),
            &[0.0, 3.0, 5.0, 7.0, 10.0],
            prior,
        );
    }

    #[test]
    fn log_normal_gradient() {
        let prior = LogNormalLnPrior1D::new(1.0, 0.5).unwrap();
        check_gradient(
            |x| ln_prior_log_normal(x, 1.0, 0.5),
            &[0.5, 1.0, 2.0, 3.0, 5.0],
            prior,
        );
        assert_eq!(prior_at(&LnPrior1D::log_normal(1.0, 0.5).unwrap(), -1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn log_uniform_gradient() {
        let prior = LogUniformLnPrior1D::new(1.0, 10.0).unwrap();
        check_gradient(
            |x| ln_prior_log_uniform(x, 1.0, 10.0),
            &[1.5, 3.0, 5.0, 7.0, 9.0],
            prior,
        );
    }

    fn prior_at(prior: &LnPrior1D, x: f64) -> f64 {
        prior.ln_prior_1d(x, None)
    }

    #[test]
    fn uniform_is_flat_inside_and_impossible_outside() {
        let prior = LnPrior1D::uniform(-1.0, 3.0).unwrap();
        assert_relative_eq!(prior_at(&prior, 0.0), -f64::ln(4.0), epsilon = 1e-15);
        assert_eq!(prior_at(&prior, 3.0), prior_at(&prior, -1.0));
        assert_eq!(prior_at(&prior, 3.5), f64::NEG_INFINITY);
        assert_eq!(prior_at(&prior, f64::NAN), f64::NEG_INFINITY);
    }

    #[test]
    fn mix_gradient_matches_finite_difference() {
        let mix = MixLnPrior1D::new(&[
            (0.5, LnPrior1D::normal(5.0, 1.0).unwrap()),
            (1.5, LnPrior1D::normal(10.0, 1.0).unwrap()),
        ])
        .unwrap();

        for x in [3.0, 5.0, 7.0, 9.0, 11.0] {
            let mut grad = 0.0;
            let ln_p = mix.ln_prior_1d(x, Some(&mut grad));
            assert!(ln_p.is_finite());

            let eps = 1e-6;
            let numerical_grad =
                (mix.ln_prior_1d(x + eps, None) - mix.ln_prior_1d(x - eps, None)) / (2.0 * eps);
            assert_relative_eq!(grad, numerical_grad, epsilon = 1e-6);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            LnPrior1D::normal(0.0, -1.0),
            Err(PriorError::NotPositive {
                name: "std",
                value: -1.0
            })
        );
        assert_eq!(
            LnPrior1D::uniform(2.0, 1.0),
            Err(PriorError::EmptyRange {
                left: 2.0,
                right: 1.0
            })
        );
        assert!(matches!(
            LnPrior1D::log_uniform(0.0, 1.0),
            Err(PriorError::NotPositive { name: "left", .. })
        ));
        assert_eq!(LnPrior1D::mix(&[]), Err(PriorError::EmptyMixture));
    }

    #[test]
    fn serde_round_trip_and_validation() {
        let prior = LnPrior1D::log_normal(0.5, 2.0).unwrap();
        let json = serde_json::to_string(&prior).unwrap();
        let back: LnPrior1D = serde_json::from_str(&json).unwrap();
        assert_eq!(prior_at(&back, 1.3), prior_at(&prior, 1.3));

        let uniform: LnPrior1D =
            serde_json::from_str(r#"{"Uniform": {"range": {"start": 0.0, "end": 2.0}}}"#).unwrap();
        assert_eq!(uniform, LnPrior1D::uniform(0.0, 2.0).unwrap());
        assert!(
            serde_json::from_str::<LnPrior1D>(r#"{"Normal": {"mu": 0.0, "std": 0.0}}"#).is_err()
        );
    }
}
