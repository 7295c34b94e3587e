use crate::error::ModelError;
use crate::float_trait::LikeFloat;

use ndarray::{Array, ArrayView, ArrayView2, Dimension, Zip};

/// Bilinear interpolation of `map` at fractional pixel coordinates
///
/// `dx` indexes rows and `dy` columns. Coordinates are clamped to `[0, n - 1]`, so samples
/// outside the map take edge values; a single-pixel axis always samples index 0. NaN coordinates
/// give NaN.
pub fn bilinear<U, D>(
    map: ArrayView2<U>,
    dx: ArrayView<f64, D>,
    dy: ArrayView<f64, D>,
) -> Result<Array<U, D>, ModelError>
where
    U: LikeFloat,
    D: Dimension,
{
    check_coordinates(&dx, &dy)?;
    let (nx, ny) = map.dim();
    Ok(Zip::from(&dx).and(&dy).par_map_collect(|&x, &y| {
        if x.is_nan() || y.is_nan() {
            return U::nan();
        }
        let (i0, i1, wx) = bracket(x, nx);
        let (j0, j1, wy) = bracket(y, ny);
        let (wx, wy) = (U::constant(wx), U::constant(wy));
        let one = U::one();
        map[[i0, j0]] * (one - wx) * (one - wy)
            + map[[i1, j0]] * wx * (one - wy)
            + map[[i0, j1]] * (one - wx) * wy
            + map[[i1, j1]] * wx * wy
    }))
}

/// Error unless timestream coordinate arrays have the same shape
pub(crate) fn check_coordinates<D: Dimension>(
    dx: &ArrayView<f64, D>,
    dy: &ArrayView<f64, D>,
) -> Result<(), ModelError> {
    if dx.shape() == dy.shape() {
        Ok(())
    } else {
        Err(ModelError::CoordinateShapeMismatch {
            dx: dx.shape().to_vec(),
            dy: dy.shape().to_vec(),
        })
    }
}

/// Lower and upper neighbours of a clamped coordinate and the weight of the upper one
#[inline]
fn bracket(x: f64, n: usize) -> (usize, usize, f64) {
    if n < 2 {
        return (0, 0, 0.0);
    }
    let last = (n - 1) as f64;
    let x = x.clamp(0.0, last);
    let lower = (x.floor() as usize).min(n - 2);
    (lower, lower + 1, x - lower as f64)
}
