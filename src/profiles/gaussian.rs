use super::VolumeProfile;
use super::geometry::Frame;
use crate::float_trait::LikeFloat;
use crate::units::Cosmology;

pub const GAUSSIAN_PARAMS: [&str; 4] = ["dx", "dy", "sigma", "amp"];

pub const EGAUSSIAN_PARAMS: [&str; 9] = [
    "dx", "dy", "dz", "r_1", "r_2", "r_3", "theta", "sigma", "amp",
];

/// Circular Gaussian on the plane of sky, constant along the line of sight
#[derive(Clone, Debug)]
pub struct Gaussian<U> {
    dx: U,
    dy: U,
    /// `-1 / (2 σ²)`
    exp_coeff: U,
    amp: U,
}

impl<U: LikeFloat> Gaussian<U> {
    pub fn new(p: &[U]) -> Self {
        let sigma = p[2];
        Self {
            dx: p[0],
            dy: p[1],
            exp_coeff: -(U::two() * sigma * sigma).recip(),
            amp: p[3],
        }
    }

    /// Value on the plane of sky
    #[inline]
    pub fn at_sky(&self, x: f64, y: f64) -> U {
        let x = U::constant(x) - self.dx;
        let y = U::constant(y) - self.dy;
        self.amp * (self.exp_coeff * (x * x + y * y)).exp()
    }
}

impl<U: LikeFloat> VolumeProfile<U> for Gaussian<U> {
    fn from_params(p: &[U], _cosmology: &Cosmology) -> Self {
        Self::new(p)
    }

    #[inline]
    fn at(&self, x: f64, y: f64, _z: f64) -> U {
        self.at_sky(x, y)
    }
}

/// Gaussian in the transformed (shifted, rotated and stretched) frame
#[derive(Clone, Debug)]
pub struct EllipticalGaussian<U> {
    frame: Frame<U>,
    exp_coeff: U,
    amp: U,
}

impl<U: LikeFloat> VolumeProfile<U> for EllipticalGaussian<U> {
    fn from_params(p: &[U], _cosmology: &Cosmology) -> Self {
        let sigma = p[7];
        Self {
            frame: Frame::from_slice(p),
            exp_coeff: -(U::two() * sigma * sigma).recip(),
            amp: p[8],
        }
    }

    #[inline]
    fn at(&self, x: f64, y: f64, z: f64) -> U {
        let (x, y, z) = self.frame.transform(x, y, z);
        self.amp * (self.exp_coeff * (x * x + y * y + z * z)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn gaussian_ignores_line_of_sight() {
        let g = Gaussian::new(&[1.0, -1.0, 2.0, 5.0]);
        assert_relative_eq!(g.at(1.0, -1.0, 0.0), 5.0, epsilon = 1e-15);
        assert_eq!(g.at(3.0, 0.0, -7.0), g.at(3.0, 0.0, 11.0));
        // (2, 1) away: r^2 = 5
        assert_relative_eq!(g.at_sky(3.0, 0.0), 5.0 * f64::exp(-5.0 / 8.0), epsilon = 1e-14);
    }

    #[test]
    fn elliptical_gaussian_follows_frame_scales() {
        let p = [0.0, 0.0, 0.0, 2.0, 1.0, 1.0, 0.0, 1.0, 3.0];
        let g = EllipticalGaussian::from_params(&p, &Cosmology::default());
        assert_relative_eq!(g.at(0.0, 0.0, 0.0), 3.0, epsilon = 1e-15);
        // stretched twice along x
        assert_relative_eq!(g.at(2.0, 0.0, 0.0), g.at(0.0, 1.0, 0.0), epsilon = 1e-15);
        assert_relative_eq!(g.at(0.0, 0.0, 1.0), 3.0 * f64::exp(-0.5), epsilon = 1e-14);
    }
}
