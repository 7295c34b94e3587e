//! Parametric pressure profiles and substructure modifiers
//!
//! Every component kind is written once, generic over [`LikeFloat`], and evaluated on the sparse
//! coordinate mesh of a [`CoordinateGrid`]. Additive kinds are summed into the 3-D field,
//! modifiers then multiply it by `1 + f` inside their ellipsoid.

mod ellipsoid;
pub use ellipsoid::{EXPONENTIAL_PARAMS, POWERLAW_COS_PARAMS, POWERLAW_PARAMS, UNIFORM_PARAMS};
use ellipsoid::{Exponential, Modifier, PowerLaw, PowerLawCos, Uniform};

mod gaussian;
pub use gaussian::{EGAUSSIAN_PARAMS, GAUSSIAN_PARAMS};
use gaussian::{EllipticalGaussian, Gaussian};

pub(crate) mod geometry;

mod pressure;
pub use pressure::{A10_PARAMS, ALPHA_P_FIXED, GNFW_PARAMS, ISOBETA_PARAMS};
use pressure::{A10, Gnfw, Isobeta};

use crate::float_trait::LikeFloat;
use crate::grid::CoordinateGrid;
use crate::units::Cosmology;

use ndarray::{Array2, Array3, Zip};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Additive profile evaluated point-wise on the grid
pub(crate) trait VolumeProfile<U: LikeFloat>: Sized + Sync {
    /// Build from the parameter block of a single instance and the background cosmology
    fn from_params(p: &[U], cosmology: &Cosmology) -> Self;

    fn at(&self, x: f64, y: f64, z: f64) -> U;
}

/// Kind of a model component
///
/// The declaration order is the order of parameter blocks in the flat parameter vector and the
/// order in which components are applied to the pressure field.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Isobeta,
    Gnfw,
    A10,
    Gaussian,
    Egaussian,
    Uniform,
    Exponential,
    Powerlaw,
    PowerlawCos,
}

impl ComponentKind {
    pub const ORDER: [Self; 9] = [
        Self::Isobeta,
        Self::Gnfw,
        Self::A10,
        Self::Gaussian,
        Self::Egaussian,
        Self::Uniform,
        Self::Exponential,
        Self::Powerlaw,
        Self::PowerlawCos,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Isobeta => "isobeta",
            Self::Gnfw => "gnfw",
            Self::A10 => "a10",
            Self::Gaussian => "gaussian",
            Self::Egaussian => "egaussian",
            Self::Uniform => "uniform",
            Self::Exponential => "exponential",
            Self::Powerlaw => "powerlaw",
            Self::PowerlawCos => "powerlaw_cos",
        }
    }

    /// Names of the per-instance parameters, in block order
    pub const fn param_names(self) -> &'static [&'static str] {
        match self {
            Self::Isobeta => &ISOBETA_PARAMS,
            Self::Gnfw => &GNFW_PARAMS,
            Self::A10 => &A10_PARAMS,
            Self::Gaussian => &GAUSSIAN_PARAMS,
            Self::Egaussian => &EGAUSSIAN_PARAMS,
            Self::Uniform => &UNIFORM_PARAMS,
            Self::Exponential => &EXPONENTIAL_PARAMS,
            Self::Powerlaw => &POWERLAW_PARAMS,
            Self::PowerlawCos => &POWERLAW_COS_PARAMS,
        }
    }

    pub const fn arity(self) -> usize {
        self.param_names().len()
    }

    /// Modifiers multiply the accumulated field instead of adding to it
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::Uniform | Self::Exponential | Self::Powerlaw | Self::PowerlawCos
        )
    }

    /// Apply a single instance with parameters `p` to `field`
    pub(crate) fn apply<U: LikeFloat>(
        self,
        p: &[U],
        grid: &CoordinateGrid,
        cosmology: &Cosmology,
        field: &mut Array3<U>,
    ) {
        debug_assert_eq!(p.len(), self.arity());
        match self {
            Self::Isobeta => add_profile(&Isobeta::from_params(p, cosmology), grid, field),
            Self::Gnfw => add_profile(&Gnfw::from_params(p, cosmology), grid, field),
            Self::A10 => add_profile(&A10::from_params(p, cosmology), grid, field),
            Self::Gaussian => add_profile(&Gaussian::from_params(p, cosmology), grid, field),
            Self::Egaussian => {
                add_profile(&EllipticalGaussian::from_params(p, cosmology), grid, field)
            }
            Self::Uniform => modify(&Uniform::from_params(p), grid, field),
            Self::Exponential => modify(&Exponential::from_params(p), grid, field),
            Self::Powerlaw => modify(&PowerLaw::from_params(p), grid, field),
            Self::PowerlawCos => modify(&PowerLawCos::from_params(p), grid, field),
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn add_profile<U, P>(profile: &P, grid: &CoordinateGrid, field: &mut Array3<U>)
where
    U: LikeFloat,
    P: VolumeProfile<U>,
{
    let (x, y, z) = (grid.x(), grid.y(), grid.z());
    Zip::indexed(field).par_for_each(|(i, j, k), value| {
        *value += profile.at(x[i], y[j], z[k]);
    });
}

fn modify<U, M>(modifier: &M, grid: &CoordinateGrid, field: &mut Array3<U>)
where
    U: LikeFloat,
    M: Modifier<U>,
{
    let (x, y, z) = (grid.x(), grid.y(), grid.z());
    Zip::indexed(field).par_for_each(|(i, j, k), value| {
        if let Some(factor) = modifier.factor(x[i], y[j], z[k]) {
            *value *= factor;
        }
    });
}

/// Add a plane-of-sky Gaussian with parameters `p` directly to a projected map
pub(crate) fn add_gaussian_to_map<U: LikeFloat>(
    p: &[U],
    grid: &CoordinateGrid,
    map: &mut Array2<U>,
) {
    let gaussian = Gaussian::new(p);
    let (x, y) = (grid.x(), grid.y());
    Zip::indexed(map).par_for_each(|(i, j), value| {
        *value += gaussian.at_sky(x[i], y[j]);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn arities_follow_parameter_lists() {
        let arities: Vec<_> = ComponentKind::ORDER.iter().map(|k| k.arity()).collect();
        assert_eq!(arities, [9, 14, 15, 4, 9, 8, 14, 11, 11]);
        assert!(ComponentKind::ORDER.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn kind_names_round_trip_through_serde() {
        for kind in ComponentKind::ORDER {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
            let back: ComponentKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn modifier_scales_additive_field_inside_ellipsoid_only() {
        let grid = CoordinateGrid::cube(4.0, 1.0).unwrap();
        let cosmology = Cosmology::default();
        let mut field = Array3::<f64>::zeros(grid.shape());
        ComponentKind::Isobeta.apply(
            &[0.0, 0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 1.0, 1.0],
            &grid,
            &cosmology,
            &mut field,
        );
        let before = field.clone();
        ComponentKind::Uniform.apply(
            &[0.0, 0.0, 0.0, 1.5, 1.5, 1.5, 0.0, 1.0],
            &grid,
            &cosmology,
            &mut field,
        );
        // centre is index 4, a point at 3 pixels is outside the r = 1.5 sphere
        assert_relative_eq!(field[[4, 4, 4]], 2.0 * before[[4, 4, 4]], epsilon = 1e-15);
        assert_relative_eq!(field[[5, 4, 4]], 2.0 * before[[5, 4, 4]], epsilon = 1e-15);
        assert_eq!(field[[7, 4, 4]], before[[7, 4, 4]]);
    }

    #[test]
    fn map_gaussian_matches_volume_slice() {
        let grid = CoordinateGrid::cube(3.0, 1.0).unwrap();
        let p = [0.5, -1.0, 1.2, 2.0];
        let mut field = Array3::<f64>::zeros(grid.shape());
        ComponentKind::Gaussian.apply(&p, &grid, &Cosmology::default(), &mut field);
        let mut map = Array2::<f64>::zeros(grid.map_shape());
        add_gaussian_to_map(&p, &grid, &mut map);
        for k in 0..grid.shape().2 {
            assert_eq!(field.index_axis(ndarray::Axis(2), k), map);
        }
    }
}
