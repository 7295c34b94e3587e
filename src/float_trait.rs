use hyperdual::Hyperdual;
use std::fmt::Debug;
use std::ops::{AddAssign, MulAssign};

/// First-order dual number: value plus a single tangent direction
pub type Dual64 = Hyperdual<f64, 2>;

/// Scalar type flowing through the model builder
///
/// Profiles, the line-of-sight integral and the post-beam stages are written once, generic over
/// this trait, and evaluated either with plain `f64` or with [`Dual64`] to propagate a tangent
/// for forward-mode differentiation.
pub trait LikeFloat:
    num_traits::Float + AddAssign<Self> + MulAssign<Self> + Debug + Send + Sync + 'static
{
    /// Does this type carry a tangent part?
    const HAS_TANGENT: bool;

    /// Lift an `f64` constant, tangent is zero
    fn constant(x: f64) -> Self;

    /// Build a scalar from its value and tangent parts
    fn from_parts(value: f64, tangent: f64) -> Self;

    fn value(self) -> f64;

    fn tangent(self) -> f64;

    #[inline]
    fn half() -> Self {
        Self::constant(0.5)
    }

    #[inline]
    fn two() -> Self {
        Self::constant(2.0)
    }
}

impl LikeFloat for f64 {
    const HAS_TANGENT: bool = false;

    #[inline]
    fn constant(x: f64) -> Self {
        x
    }

    #[inline]
    fn from_parts(value: f64, _tangent: f64) -> Self {
        value
    }

    #[inline]
    fn value(self) -> f64 {
        self
    }

    #[inline]
    fn tangent(self) -> f64 {
        0.0
    }
}

impl LikeFloat for Dual64 {
    const HAS_TANGENT: bool = true;

    #[inline]
    fn constant(x: f64) -> Self {
        Hyperdual::from_real(x)
    }

    #[inline]
    fn from_parts(value: f64, tangent: f64) -> Self {
        let mut d = Hyperdual::from_real(value);
        d[1] = tangent;
        d
    }

    #[inline]
    fn value(self) -> f64 {
        self[0]
    }

    #[inline]
    fn tangent(self) -> f64 {
        self[1]
    }
}

/// Seed dual parameters: every entry is constant except `direction`, whose tangent is one
pub(crate) fn seed_direction(params: &[f64], direction: usize) -> Vec<Dual64> {
    params
        .iter()
        .enumerate()
        .map(|(i, &p)| Dual64::from_parts(p, if i == direction { 1.0 } else { 0.0 }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use num_traits::Float;

    #[test]
    fn dual_parts_round_trip() {
        let d = Dual64::from_parts(2.0, -3.0);
        assert_eq!(d.value(), 2.0);
        assert_eq!(d.tangent(), -3.0);
        assert_eq!(Dual64::constant(4.0).tangent(), 0.0);
        assert_eq!(1.5f64.tangent(), 0.0);
    }

    #[test]
    fn dual_propagates_chain_rule() {
        let x = Dual64::from_parts(0.7, 1.0);
        let y = (x * x).exp() + x.sin();
        assert_relative_eq!(y.value(), f64::exp(0.49) + f64::sin(0.7), epsilon = 1e-14);
        assert_relative_eq!(
            y.tangent(),
            2.0 * 0.7 * f64::exp(0.49) + f64::cos(0.7),
            epsilon = 1e-14
        );
    }

    #[test]
    fn seed_direction_sets_single_tangent() {
        let seeded = seed_direction(&[1.0, 2.0, 3.0], 1);
        let tangents: Vec<_> = seeded.iter().map(|d| d.tangent()).collect();
        assert_eq!(tangents, [0.0, 1.0, 0.0]);
        let values: Vec<_> = seeded.iter().map(|d| d.value()).collect();
        assert_eq!(values, [1.0, 2.0, 3.0]);
    }
}
