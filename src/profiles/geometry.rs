use crate::float_trait::LikeFloat;

/// Smallest radius allowed under power laws, keeps values and derivatives finite at the centre
pub(crate) const RADIUS_FLOOR: f64 = 1e-12;

/// Shifted, rotated and stretched frame of a single component
///
/// Maps grid coordinates into the component frame: shift by `(dx, dy, dz)`, rotate the plane of
/// sky by `theta`, divide by the scale radii `(r_1, r_2, r_3)`.
#[derive(Clone, Debug)]
pub(crate) struct Frame<U> {
    dx: U,
    dy: U,
    dz: U,
    cos: U,
    sin: U,
    inv_r1: U,
    inv_r2: U,
    inv_r3: U,
}

impl<U: LikeFloat> Frame<U> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(dx: U, dy: U, dz: U, r_1: U, r_2: U, r_3: U, theta: U) -> Self {
        Self {
            dx,
            dy,
            dz,
            cos: theta.cos(),
            sin: theta.sin(),
            inv_r1: r_1.recip(),
            inv_r2: r_2.recip(),
            inv_r3: r_3.recip(),
        }
    }

    /// Frame from the leading seven entries `dx, dy, dz, r_1, r_2, r_3, theta`
    pub(crate) fn from_slice(p: &[U]) -> Self {
        Self::new(p[0], p[1], p[2], p[3], p[4], p[5], p[6])
    }

    /// Same frame with every scale radius multiplied by `scale`
    pub(crate) fn scaled(mut self, scale: U) -> Self {
        let inv = scale.recip();
        self.inv_r1 *= inv;
        self.inv_r2 *= inv;
        self.inv_r3 *= inv;
        self
    }

    #[inline]
    pub(crate) fn transform(&self, x: f64, y: f64, z: f64) -> (U, U, U) {
        let x = U::constant(x) - self.dx;
        let y = U::constant(y) - self.dy;
        let z = U::constant(z) - self.dz;
        let xx = x * self.cos + y * self.sin;
        let yy = y * self.cos - x * self.sin;
        (xx * self.inv_r1, yy * self.inv_r2, z * self.inv_r3)
    }
}

/// Radius with a floor, safe to raise to any power and to differentiate
#[inline]
pub(crate) fn floored_radius<U: LikeFloat>(rr: U) -> U {
    rr.max(U::constant(RADIUS_FLOOR * RADIUS_FLOOR)).sqrt()
}

/// Polar angle in the plane of sky, zero on the frame axis where it is undefined
#[inline]
pub(crate) fn polar_angle<U: LikeFloat>(x: U, y: U) -> U {
    if (x * x + y * y).value() < RADIUS_FLOOR * RADIUS_FLOOR {
        U::zero()
    } else {
        y.atan2(x)
    }
}
