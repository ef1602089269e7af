//! The intersection record returned by primitive tests and by k-d tree
//! traversal (§3 Data Model): parametric `t` (`t <= 0` means miss), the
//! unit outward normal and tangent in world space, surface UVs, and the
//! hit material.

use crate::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub t: f32,
    pub surface_normal: Vec3,
    pub surface_tangent: Vec3,
    pub uv: (f32, f32),
    pub material_id: u32,
    /// Index of the `Geom` that was hit, so the integrator can tell whether
    /// a BSDF-sampled ray re-hit the same emissive geometry it started the
    /// light-sampling term from (§4.E.3).
    pub geom_id: u32,
}

impl Intersection {
    pub fn is_hit(&self) -> bool {
        self.t > 0.0
    }
}
