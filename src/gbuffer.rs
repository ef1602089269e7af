//! G-buffer capture at the primary hit (§4.H): per-pixel surface normal,
//! oct-encoded to a 2-vector, and the primary-ray hit distance ("z-depth"),
//! from which world position is reconstructed by re-tracing the primary
//! ray rather than storing position directly.

use crate::geometry::Ray;
use crate::math::Vec3;

#[derive(Debug, Clone, Copy, Default)]
pub struct GBufferPixel {
    /// Signed-octahedron-encoded unit normal.
    pub oct_normal: (f32, f32),
    /// Hit distance along the primary ray; `f32::INFINITY` on a miss.
    pub depth: f32,
}

impl GBufferPixel {
    pub fn miss() -> GBufferPixel {
        GBufferPixel { oct_normal: (0.0, 0.0), depth: f32::INFINITY }
    }

    pub fn is_miss(&self) -> bool {
        !self.depth.is_finite()
    }
}

fn sign_nonzero(v: f32) -> f32 {
    if v >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Map a unit normal onto the signed-octahedron 2-vector.
pub fn encode_oct_normal(n: Vec3) -> (f32, f32) {
    let l1_norm = n.x.abs() + n.y.abs() + n.z.abs();
    let (mut px, mut py) = (n.x / l1_norm, n.y / l1_norm);
    if n.z < 0.0 {
        let (ox, oy) = (px, py);
        px = (1.0 - oy.abs()) * sign_nonzero(ox);
        py = (1.0 - ox.abs()) * sign_nonzero(oy);
    }
    (px, py)
}

/// Inverse of `encode_oct_normal`: restore `z = 1 - |x| - |y|`, fold `xy`
/// back out of the lower hemisphere if `z < 0`, renormalize.
pub fn decode_oct_normal(p: (f32, f32)) -> Vec3 {
    let mut z = 1.0 - p.0.abs() - p.1.abs();
    let (mut x, mut y) = (p.0, p.1);
    if z < 0.0 {
        let (ox, oy) = (x, y);
        x = (1.0 - oy.abs()) * sign_nonzero(ox);
        y = (1.0 - ox.abs()) * sign_nonzero(oy);
        z = 1.0 - x.abs() - y.abs();
    }
    Vec3::new(x, y, z).normalized()
}

/// Reconstruct the world-space hit position from a decoded z-depth sample
/// and the primary ray that produced it.
pub fn decode_position(primary_ray: &Ray, depth: f32) -> Vec3 {
    primary_ray.at(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oct_normal_round_trips_axis_aligned() {
        for n in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ] {
            let encoded = encode_oct_normal(n);
            let decoded = decode_oct_normal(encoded);
            assert!((decoded - n).length() < 1e-4, "{:?} -> {:?} -> {:?}", n, encoded, decoded);
        }
    }

    #[test]
    fn oct_normal_round_trips_arbitrary_directions() {
        for i in 0..40 {
            let theta = i as f32 * 0.31;
            let phi = i as f32 * 0.77;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()).normalized();
            let decoded = decode_oct_normal(encode_oct_normal(n));
            assert!((decoded - n).length() < 1e-3);
        }
    }

    #[test]
    fn z_depth_reconstructs_hit_point() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let p = decode_position(&ray, 4.0);
        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
