use crate::error::ModelError;

use ndarray::{Array1, ArrayView, Dimension, Zip};

/// Sparse `ij`-indexed coordinate mesh the volumetric profiles are evaluated on
///
/// Axes are in arcseconds and uniformly spaced. The last axis (`z`) is the line of sight.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateGrid {
    x: Array1<f64>,
    y: Array1<f64>,
    z: Array1<f64>,
}

impl CoordinateGrid {
    /// Build a grid from three axes, each must be non-empty and uniformly spaced
    pub fn new(x: Array1<f64>, y: Array1<f64>, z: Array1<f64>) -> Result<Self, ModelError> {
        for (name, axis) in [('x', &x), ('y', &y), ('z', &z)] {
            check_axis(name, axis)?;
        }
        Ok(Self { x, y, z })
    }

    /// Cube `[-r_map, r_map)` sampled with step `dr` along every axis
    ///
    /// Axis values are `-r_map + i * dr`, so the origin lands on index `n / 2` whenever
    /// `r_map` is a multiple of `dr`.
    pub fn cube(r_map: f64, dr: f64) -> Result<Self, ModelError> {
        let axis = arange(-r_map, r_map, dr);
        Self::new(axis.clone(), axis.clone(), axis)
    }

    #[inline]
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    #[inline]
    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    #[inline]
    pub fn z(&self) -> &Array1<f64> {
        &self.z
    }

    /// Shape of the 3-D field, `(nx, ny, nz)`
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.x.len(), self.y.len(), self.z.len())
    }

    /// Shape of the projected map, `(nx, ny)`
    #[inline]
    pub fn map_shape(&self) -> (usize, usize) {
        (self.x.len(), self.y.len())
    }

    /// Pixel size along the plane-of-sky axes, falls back to 1 for single-pixel axes
    pub fn spacing(&self) -> (f64, f64) {
        (axis_step(&self.x), axis_step(&self.y))
    }

    /// Map plane-of-sky offsets in arcseconds to fractional pixel indices
    pub fn offsets_to_pixel<D>(
        &self,
        x_arcsec: ArrayView<f64, D>,
        y_arcsec: ArrayView<f64, D>,
    ) -> Result<(ndarray::Array<f64, D>, ndarray::Array<f64, D>), ModelError>
    where
        D: Dimension,
    {
        if x_arcsec.shape() != y_arcsec.shape() {
            return Err(ModelError::CoordinateShapeMismatch {
                dx: x_arcsec.shape().to_vec(),
                dy: y_arcsec.shape().to_vec(),
            });
        }
        let (step_x, step_y) = self.spacing();
        let (x0, y0) = (self.x[0], self.y[0]);
        Ok((
            x_arcsec.mapv(|v| (v - x0) / step_x),
            y_arcsec.mapv(|v| (v - y0) / step_y),
        ))
    }

    /// Convert sky coordinates of timestream samples into fractional pixel indices
    ///
    /// `ra`, `dec`, `ra0` and `dec0` are in radians, `conv` converts radians into the grid units
    /// (arcseconds for grids built by [`CoordinateGrid::cube`]). The RA offset is multiplied by
    /// `cos(dec)`.
    pub fn sky_to_pixel<D>(
        &self,
        ra: ArrayView<f64, D>,
        dec: ArrayView<f64, D>,
        ra0: f64,
        dec0: f64,
        conv: f64,
    ) -> Result<(ndarray::Array<f64, D>, ndarray::Array<f64, D>), ModelError>
    where
        D: Dimension,
    {
        if ra.shape() != dec.shape() {
            return Err(ModelError::CoordinateShapeMismatch {
                dx: ra.shape().to_vec(),
                dy: dec.shape().to_vec(),
            });
        }
        let x = Zip::from(&ra)
            .and(&dec)
            .map_collect(|&ra, &dec| (ra - ra0) * dec.cos() * conv);
        let y = dec.mapv(|dec| (dec - dec0) * conv);
        self.offsets_to_pixel(x.view(), y.view())
    }
}

/// `numpy.arange`-like axis: `start + i * step` for all values below `stop`
pub fn arange(start: f64, stop: f64, step: f64) -> Array1<f64> {
    let n = ((stop - start) / step).ceil();
    let n = if n.is_finite() && n > 0.0 { n as usize } else { 0 };
    Array1::from_shape_fn(n, |i| start + (i as f64) * step)
}

fn axis_step(axis: &Array1<f64>) -> f64 {
    if axis.len() > 1 {
        axis[1] - axis[0]
    } else {
        1.0
    }
}

fn check_axis(name: char, axis: &Array1<f64>) -> Result<(), ModelError> {
    if axis.is_empty() {
        return Err(ModelError::EmptyGrid(name));
    }
    if axis.len() < 2 {
        return Ok(());
    }
    let step = axis[1] - axis[0];
    if !(step.is_finite() && step > 0.0) {
        return Err(ModelError::NonUniformAxis(name));
    }
    let uniform = axis
        .windows(2)
        .into_iter()
        .all(|w| ((w[1] - w[0]) - step).abs() <= 1e-9 * step.abs().max(1.0));
    if uniform {
        Ok(())
    } else {
        Err(ModelError::NonUniformAxis(name))
    }
}
