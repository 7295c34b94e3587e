//! FFT-based circular convolution of projected maps

use lazy_static::lazy_static;
use ndarray::{Array2, ArrayView2, Axis};
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::{Arc, Mutex, PoisonError};

lazy_static! {
    static ref PLANNER: Mutex<FftPlanner<f64>> = Mutex::new(FftPlanner::new());
}

/// Forward and inverse plans of a single transform length
///
/// Plans are cached by the planner keyed on length only, they never depend on the data.
#[derive(Clone)]
struct PlanPair {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl PlanPair {
    fn new(len: usize) -> Self {
        let mut planner = PLANNER.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(len, "planning FFT");
        Self {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }
}

/// Roll both axes by `n / 2`, moving the centre pixel to the origin (`numpy.fft.fftshift`)
pub fn fftshift<A: Clone>(a: ArrayView2<A>) -> Array2<A> {
    let (nx, ny) = a.dim();
    roll(a, nx / 2, ny / 2)
}

/// Inverse of [`fftshift`] (`numpy.fft.ifftshift`)
pub fn ifftshift<A: Clone>(a: ArrayView2<A>) -> Array2<A> {
    let (nx, ny) = a.dim();
    roll(a, nx - nx / 2, ny - ny / 2)
}

/// Circular shift: `out[(i + sx) % nx, (j + sy) % ny] = a[i, j]`
fn roll<A: Clone>(a: ArrayView2<A>, sx: usize, sy: usize) -> Array2<A> {
    let (nx, ny) = a.dim();
    Array2::from_shape_fn((nx, ny), |(i, j)| {
        a[[(i + nx - sx % nx) % nx, (j + ny - sy % ny) % ny]].clone()
    })
}

/// Reusable 2-D circular convolution with a fixed kernel
///
/// The kernel spectrum and the FFT plans are computed once, so evaluating the convolution only
/// costs one forward and one inverse 2-D transform.
#[derive(Clone)]
pub struct ConvolutionPlan {
    shape: (usize, usize),
    rows: PlanPair,
    cols: PlanPair,
    kernel_spectrum: Array2<Complex64>,
}

impl std::fmt::Debug for ConvolutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvolutionPlan")
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl ConvolutionPlan {
    /// `kernel` must already have the map shape, see [`crate::beam::pad_beam`]
    pub fn new(kernel: ArrayView2<f64>) -> Self {
        let shape = kernel.dim();
        let rows = PlanPair::new(shape.1);
        let cols = if shape.0 == shape.1 {
            rows.clone()
        } else {
            PlanPair::new(shape.0)
        };
        let mut kernel_spectrum = fftshift(kernel).mapv(|v| Complex64::new(v, 0.0));
        transform2(&mut kernel_spectrum, &rows.forward, &cols.forward);
        Self {
            shape,
            rows,
            cols,
            kernel_spectrum,
        }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Circular convolution of `image` with the kernel
    ///
    /// `ifftshift(Re(ifft2(fft2(fftshift(image)) * fft2(fftshift(kernel)))))`; the kernel
    /// element at index `n - n / 2` along each axis acts as the origin.
    pub fn convolve(&self, image: ArrayView2<f64>) -> Array2<f64> {
        debug_assert_eq!(image.dim(), self.shape);
        let mut spectrum = fftshift(image).mapv(|v| Complex64::new(v, 0.0));
        transform2(&mut spectrum, &self.rows.forward, &self.cols.forward);
        spectrum *= &self.kernel_spectrum;
        transform2(&mut spectrum, &self.rows.inverse, &self.cols.inverse);
        let norm = (self.shape.0 * self.shape.1) as f64;
        let real = spectrum.mapv(|c| c.re / norm);
        ifftshift(real.view())
    }
}

/// In-place 2-D transform: rows first, then columns
fn transform2(data: &mut Array2<Complex64>, rows: &Arc<dyn Fft<f64>>, cols: &Arc<dyn Fft<f64>>) {
    let mut buffer = Vec::with_capacity(data.nrows().max(data.ncols()));
    for mut lane in data.lanes_mut(Axis(1)) {
        buffer.clear();
        buffer.extend(lane.iter().copied());
        rows.process(&mut buffer);
        lane.iter_mut().zip(&buffer).for_each(|(x, &y)| *x = y);
    }
    for mut lane in data.lanes_mut(Axis(0)) {
        buffer.clear();
        buffer.extend(lane.iter().copied());
        cols.process(&mut buffer);
        lane.iter_mut().zip(&buffer).for_each(|(x, &y)| *x = y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::prelude::*;

    #[test]
    fn shifts_match_numpy() {
        let a = array![[0, 1, 2], [3, 4, 5], [6, 7, 8]];
        // numpy.fft.fftshift(np.arange(9).reshape(3, 3))
        assert_eq!(fftshift(a.view()), array![[8, 6, 7], [2, 0, 1], [5, 3, 4]]);
        // numpy.fft.ifftshift(np.arange(9).reshape(3, 3))
        assert_eq!(ifftshift(a.view()), array![[4, 5, 3], [7, 8, 6], [1, 2, 0]]);
        assert_eq!(ifftshift(fftshift(a.view()).view()), a);

        let b = array![[0, 1, 2, 3]];
        assert_eq!(fftshift(b.view()), array![[2, 3, 0, 1]]);
    }

    fn direct_circular_convolution(image: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
        let (nx, ny) = image.dim();
        let (ox, oy) = (nx - nx / 2, ny - ny / 2);
        Array2::from_shape_fn((nx, ny), |(i, j)| {
            let mut acc = 0.0;
            for ((k, l), &w) in kernel.indexed_iter() {
                let si = (i + 2 * nx + ox - k) % nx;
                let sj = (j + 2 * ny + oy - l) % ny;
                acc += w * image[[si, sj]];
            }
            acc
        })
    }

    #[test]
    fn fft_convolution_matches_direct_sum() {
        let mut rng = StdRng::seed_from_u64(0);
        for (nx, ny) in [(8, 8), (7, 10), (5, 5)] {
            let image = Array2::from_shape_fn((nx, ny), |_| rng.random::<f64>());
            let kernel = Array2::from_shape_fn((nx, ny), |_| rng.random::<f64>());
            let plan = ConvolutionPlan::new(kernel.view());
            let actual = plan.convolve(image.view());
            let desired = direct_circular_convolution(&image, &kernel);
            assert_relative_eq!(actual, desired, epsilon = 1e-10);
        }
    }

    #[test]
    fn delta_kernel_at_origin_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in [6, 7] {
            let image = Array2::from_shape_fn((n, n), |_| rng.random::<f64>());
            let mut kernel = Array2::zeros((n, n));
            kernel[[n - n / 2, n - n / 2]] = 1.0;
            let actual = ConvolutionPlan::new(kernel.view()).convolve(image.view());
            assert_relative_eq!(actual, image, epsilon = 1e-12);
        }
    }
}
