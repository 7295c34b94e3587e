use crate::beam::pad_beam;
use crate::config::ModelOptions;
use crate::error::ModelError;
use crate::fft::ConvolutionPlan;
use crate::float_trait::LikeFloat;
use crate::grid::CoordinateGrid;
use crate::interp::{bilinear, check_coordinates};
use crate::layout::{ComponentCounts, ParameterLayout};
use crate::profiles::{ComponentKind, add_gaussian_to_map};

use ndarray::{Array, Array2, Array3, ArrayView, ArrayView2, Axis, Dimension, Zip};

/// Forward model of a cluster observation
///
/// Holds the static part of the problem: the coordinate grid, the component layout, the
/// line-of-sight step and the beam spectrum. Evaluation is a pure function of the parameter
/// vector, so a single `Model` can be shared between threads.
#[derive(Clone, Debug)]
pub struct Model {
    grid: CoordinateGrid,
    layout: ParameterLayout,
    dz: f64,
    beam_shape: (usize, usize),
    convolution: ConvolutionPlan,
    options: ModelOptions,
}

impl Model {
    /// Build the model
    ///
    /// `dz` is the line-of-sight integration step, typically [`crate::units::dz_factor`], and
    /// `beam` is any kernel not larger than the projected map `(nx, ny)`; it is zero-padded and
    /// transformed once here.
    pub fn new(
        grid: CoordinateGrid,
        counts: ComponentCounts,
        dz: f64,
        beam: ArrayView2<f64>,
        options: ModelOptions,
    ) -> Result<Self, ModelError> {
        let layout = ParameterLayout::new(counts);
        let map_shape = grid.map_shape();
        let padded = pad_beam(beam, map_shape)?;
        let convolution = ConvolutionPlan::new(padded.view());
        tracing::debug!(
            nparams = layout.len(),
            grid = ?grid.shape(),
            beam = ?beam.dim(),
            placement = ?options.gaussian_placement,
            "model plan built"
        );
        Ok(Self {
            grid,
            layout,
            dz,
            beam_shape: beam.dim(),
            convolution,
            options,
        })
    }

    #[inline]
    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    #[inline]
    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Number of model parameters
    #[inline]
    pub fn nparams(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn dz(&self) -> f64 {
        self.dz
    }

    #[inline]
    pub fn beam_shape(&self) -> (usize, usize) {
        self.beam_shape
    }

    #[inline]
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Beam-convolved projected map of shape `(nx, ny)`
    pub fn model(&self, params: &[f64]) -> Result<Array2<f64>, ModelError> {
        self.layout.check_len(params.len())?;
        Ok(self.evaluate_map(params))
    }

    /// Model map sampled at timestream pixel coordinates `(dx, dy)`
    ///
    /// See [`bilinear`](crate::interp::bilinear) for the interpolation and out-of-bounds policy.
    /// The output has the shape of `dx`.
    pub fn model_tod<D: Dimension>(
        &self,
        params: &[f64],
        dx: ArrayView<f64, D>,
        dy: ArrayView<f64, D>,
    ) -> Result<Array<f64, D>, ModelError> {
        check_coordinates(&dx, &dy)?;
        let map = self.model(params)?;
        bilinear(map.view(), dx, dy)
    }

    /// Unchecked evaluation, `params` must follow the layout
    pub(crate) fn evaluate_map<U: LikeFloat>(&self, params: &[U]) -> Array2<U> {
        let field = self.pressure(params);
        let projected = self.integrate(&field);
        let mut map = self.convolve(projected);
        if self.options.gaussian_placement.on_map() {
            for (_, p) in self
                .layout
                .instances(params)
                .filter(|(kind, _)| *kind == ComponentKind::Gaussian)
            {
                add_gaussian_to_map(p, &self.grid, &mut map);
            }
        }
        map
    }

    /// 3-D field: additive kinds summed, then modifiers applied, in layout order
    fn pressure<U: LikeFloat>(&self, params: &[U]) -> Array3<U> {
        let mut field = Array3::from_elem(self.grid.shape(), U::zero());
        let cosmology = &self.options.cosmology;
        for (kind, p) in self.layout.instances(params) {
            if kind == ComponentKind::Gaussian && !self.options.gaussian_placement.in_volume() {
                continue;
            }
            kind.apply(p, &self.grid, cosmology, &mut field);
        }
        field
    }

    /// Trapezoidal integral along the line of sight with step `dz`
    fn integrate<U: LikeFloat>(&self, field: &Array3<U>) -> Array2<U> {
        let dz = U::constant(self.dz);
        Zip::from(field.lanes(Axis(2))).par_map_collect(|lane| {
            let n = lane.len();
            if n < 2 {
                return U::zero();
            }
            let interior = lane.iter().fold(U::zero(), |acc, &v| acc + v);
            dz * (interior - U::half() * (lane[0] + lane[n - 1]))
        })
    }

    /// Beam convolution, applied separately to the value and tangent parts
    fn convolve<U: LikeFloat>(&self, map: Array2<U>) -> Array2<U> {
        let value = self.convolution.convolve(map.mapv(U::value).view());
        if !U::HAS_TANGENT {
            return value.mapv(U::constant);
        }
        let tangent = self.convolution.convolve(map.mapv(U::tangent).view());
        Zip::from(&value)
            .and(&tangent)
            .map_collect(|&v, &t| U::from_parts(v, t))
    }
}
