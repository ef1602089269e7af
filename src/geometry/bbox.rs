//! Axis-aligned bounding box, grounded on the slab test the teacher's
//! `pbr-core` BVH traversal calls as `bounds.intersect_p_fast` (precomputed
//! inverse ray direction + sign lookup, same trick the k-d tree traversal
//! in `crate::kdtree` reuses per node).

use crate::math::Vec3;
use super::ray::Ray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox {
    pub fn empty() -> BBox {
        BBox {
            min: Vec3::broadcast(f32::INFINITY),
            max: Vec3::broadcast(f32::NEG_INFINITY),
        }
    }

    pub fn singular(p: Vec3) -> BBox {
        BBox { min: p, max: p }
    }

    #[must_use]
    pub fn union_point(&self, p: Vec3) -> BBox {
        BBox {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    #[must_use]
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_extent_axis(&self) -> usize {
        self.extent().max_axis()
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.extent();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            0.0
        } else {
            2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
        }
    }

    /// Slab test against `ray`'s current `[min_t, max_t]` window. `inv_dir`
    /// is `1 / ray.d` component-wise, precomputed once per ray by the
    /// caller (the k-d tree traversal calls this once per visited node).
    pub fn intersect_p(&self, ray: &Ray, inv_dir: Vec3) -> bool {
        let mut t0 = ray.min_t;
        let mut t1 = ray.max_t;
        for axis in 0..3 {
            let mut t_near = (self.min[axis] - ray.o[axis]) * inv_dir[axis];
            let mut t_far = (self.max[axis] - ray.o[axis]) * inv_dir[axis];
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t0 = t0.max(t_near);
            t1 = t1.min(t_far);
            if t0 > t1 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_box_hits() {
        let b = BBox {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let inv = Vec3::new(1.0 / ray.d.x.max(1e-9), 1.0 / ray.d.y.max(1e-9), 1.0 / ray.d.z);
        assert!(b.intersect_p(&ray, inv));
    }

    #[test]
    fn ray_missing_box_is_rejected() {
        let b = BBox {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let ray = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let inv = Vec3::new(1e9, 1e9, 1.0 / ray.d.z);
        assert!(!b.intersect_p(&ray, inv));
    }
}
