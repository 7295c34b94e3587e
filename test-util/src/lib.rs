//! Synthetic fixtures: scan patterns, noise realisations and analytic beam kernels
//!
//! Everything here is plain `ndarray` so the fixtures can be fed to any crate under test.

use ndarray::Array2;
use rand::prelude::*;
use rand_distr::StandardNormal;

/// Constant-velocity raster scan over a square map of `map_side` pixels
///
/// Returns `(dx, dy)` of shape `(ndet, nsamp)` in fractional pixel units. Detectors are offset
/// from each other along the cross-scan direction by `det_spacing` pixels; the boresight sweeps
/// rows back and forth, `nrows` rows spread evenly across the map.
pub fn raster_scan(
    map_side: usize,
    ndet: usize,
    nsamp: usize,
    nrows: usize,
    det_spacing: f64,
) -> (Array2<f64>, Array2<f64>) {
    let last = map_side.saturating_sub(1) as f64;
    let nrows = nrows.max(1);
    let per_row = nsamp.div_ceil(nrows).max(2);
    let row_step = if nrows > 1 {
        last / (nrows - 1) as f64
    } else {
        0.0
    };
    let boresight = |s: usize| {
        let row = s / per_row;
        let along = (s % per_row) as f64 / (per_row - 1) as f64 * last;
        let along = if row % 2 == 0 { along } else { last - along };
        (row as f64 * row_step, along)
    };
    let dx = Array2::from_shape_fn((ndet, nsamp), |(d, s)| {
        boresight(s).0 + det_spacing * (d as f64 - 0.5 * ndet.saturating_sub(1) as f64)
    });
    let dy = Array2::from_shape_fn((ndet, nsamp), |(_, s)| boresight(s).1);
    (dx, dy)
}

/// Gaussian white noise of shape `(ndet, nsamp)` with per-detector standard deviations
pub fn white_noise(std: &[f64], nsamp: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((std.len(), nsamp), |(d, _)| {
        std[d] * rng.sample::<f64, _>(StandardNormal)
    })
}

/// Beam kernel that is the identity under FFT convolution: a single one at `side - side / 2`
///
/// `side` must be at least 2, odd sides act as identity on maps of either parity.
pub fn identity_beam(side: usize) -> Array2<f64> {
    let mut beam = Array2::zeros((side, side));
    beam[[side - side / 2, side - side / 2]] = 1.0;
    beam
}

/// Unit-sum circular Gaussian kernel with `sigma` in pixels, centred like [`identity_beam`]
pub fn gaussian_beam(side: usize, sigma: f64) -> Array2<f64> {
    let centre = (side - side / 2) as f64;
    let beam = Array2::from_shape_fn((side, side), |(i, j)| {
        let rr = (i as f64 - centre).powi(2) + (j as f64 - centre).powi(2);
        f64::exp(-0.5 * rr / sigma.powi(2))
    });
    let total = beam.sum();
    beam / total
}
