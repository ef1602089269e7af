//! Shared triangle/vertex pool for mesh instances (§3, §9 "Arena + index"):
//! a `TRIANGLE_MESH_INSTANCE` geom stores an index range into these flat
//! arrays rather than owning its own triangles, so many instances can
//! share one mesh upload.
//!
//! `intersect_triangle` is Möller-Trumbore, adapted from the teacher's
//! `geometry::mesh::intersect_triangle` (same barycentric-coordinate
//! derivation, same early-out order), with the ray-differential/dp_du
//! machinery dropped since this engine doesn't use texture filtering.

use crate::math::{cross, dot, Vec3};
use super::ray::Ray;

#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: (f32, f32),
}

#[derive(Debug, Default)]
pub struct TrianglePool {
    pub vertices: Vec<Vertex>,
    /// Flattened triangle indices, 3 per triangle.
    pub indices: Vec<u32>,
}

impl TrianglePool {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, tri_index: usize) -> (Vertex, Vertex, Vertex) {
        let base = tri_index * 3;
        (
            self.vertices[self.indices[base] as usize],
            self.vertices[self.indices[base + 1] as usize],
            self.vertices[self.indices[base + 2] as usize],
        )
    }
}

/// Result of a triangle hit, in the same object space the ray was given in.
pub struct TriangleHit {
    pub t: f32,
    pub normal: Vec3,
    pub uv: (f32, f32),
}

/// Möller-Trumbore ray-triangle intersection. Returns `None` on a miss or
/// on a hit outside `[ray.min_t, ray.max_t]`.
pub fn intersect_triangle(ray: &Ray, a: &Vertex, b: &Vertex, c: &Vertex) -> Option<TriangleHit> {
    let e1 = b.position - a.position;
    let e2 = c.position - a.position;
    let p_vec = cross(ray.d, e2);
    let det = dot(e1, p_vec);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;

    let t_vec = ray.o - a.position;
    let bary_b = dot(t_vec, p_vec) * inv_det;
    if !(0.0..=1.0).contains(&bary_b) {
        return None;
    }

    let q_vec = cross(t_vec, e1);
    let bary_c = dot(ray.d, q_vec) * inv_det;
    if bary_c < 0.0 || bary_b + bary_c > 1.0 {
        return None;
    }

    let t = dot(e2, q_vec) * inv_det;
    if t < ray.min_t || t > ray.max_t {
        return None;
    }
    let bary_a = 1.0 - bary_b - bary_c;

    let normal = (a.normal * bary_a + b.normal * bary_b + c.normal * bary_c).normalized();
    let uv = (
        a.uv.0 * bary_a + b.uv.0 * bary_b + c.uv.0 * bary_c,
        a.uv.1 * bary_a + b.uv.1 * bary_b + c.uv.1 * bary_c,
    );
    Some(TriangleHit { t, normal, uv })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Vertex, Vertex, Vertex) {
        (
            Vertex { position: Vec3::new(-1.0, -1.0, 0.0), normal: Vec3::new(0.0, 0.0, 1.0), uv: (0.0, 0.0) },
            Vertex { position: Vec3::new(1.0, -1.0, 0.0), normal: Vec3::new(0.0, 0.0, 1.0), uv: (1.0, 0.0) },
            Vertex { position: Vec3::new(0.0, 1.0, 0.0), normal: Vec3::new(0.0, 0.0, 1.0), uv: (0.5, 1.0) },
        )
    }

    #[test]
    fn ray_through_center_hits() {
        let (a, b, c) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, -0.3, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = intersect_triangle(&ray, &a, &b, &c).expect("should hit");
        assert!((hit.t - 5.0).abs() < 1e-4);
    }

    #[test]
    fn ray_outside_triangle_misses() {
        let (a, b, c) = unit_triangle();
        let ray = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&ray, &a, &b, &c).is_none());
    }
}
