//! Primitive geometry (§3 Data Model: `SPHERE`, `CUBE`,
//! `TRIANGLE_MESH_INSTANCE`). Each `Geom` carries its own object-to-world
//! `Transform`, a `material_id`, and a world-space `BBox` for the k-d tree
//! builder. Intersection happens in object space (ray transformed in,
//! normal transformed back out by the inverse-transpose, per §4.B) the
//! same way the teacher's `geometry::sphere`/`geometry::mesh` intersect
//! methods work, just collapsed onto one enum instead of a `Geometry`
//! trait object.

mod bbox;
pub mod mesh;
mod intersection;
mod ray;

pub use bbox::BBox;
pub use intersection::Intersection;
pub use mesh::{intersect_triangle, TrianglePool, Vertex};
pub use ray::{Ray, RAY_EPSILON};

use crate::math::{dot, Transform, Vec3};

#[derive(Debug, Clone, Copy)]
pub enum GeomKind {
    Sphere { radius: f32 },
    Cube { half_extent: f32 },
    /// Indexes a contiguous range of triangles in the scene's shared
    /// `TrianglePool` (§9 "index into a shared pool, not an owned mesh").
    TriangleMeshInstance { first_triangle: u32, num_triangles: u32 },
}

#[derive(Debug, Clone)]
pub struct Geom {
    pub kind: GeomKind,
    pub transform: Transform,
    pub material_id: u32,
    pub world_bounds: BBox,
}

impl Geom {
    pub fn sphere(radius: f32, transform: Transform, material_id: u32) -> Geom {
        let world_bounds = transform_bounds(&transform, BBox {
            min: Vec3::broadcast(-radius),
            max: Vec3::broadcast(radius),
        });
        Geom { kind: GeomKind::Sphere { radius }, transform, material_id, world_bounds }
    }

    pub fn cube(half_extent: f32, transform: Transform, material_id: u32) -> Geom {
        let world_bounds = transform_bounds(&transform, BBox {
            min: Vec3::broadcast(-half_extent),
            max: Vec3::broadcast(half_extent),
        });
        Geom { kind: GeomKind::Cube { half_extent }, transform, material_id, world_bounds }
    }

    pub fn triangle_mesh_instance(
        first_triangle: u32,
        num_triangles: u32,
        transform: Transform,
        material_id: u32,
        pool: &TrianglePool,
    ) -> Geom {
        let mut bounds = BBox::empty();
        for i in first_triangle..first_triangle + num_triangles {
            let (a, b, c) = pool.triangle(i as usize);
            bounds = bounds.union_point(transform.transform_point(a.position));
            bounds = bounds.union_point(transform.transform_point(b.position));
            bounds = bounds.union_point(transform.transform_point(c.position));
        }
        Geom {
            kind: GeomKind::TriangleMeshInstance { first_triangle, num_triangles },
            transform,
            material_id,
            world_bounds: bounds,
        }
    }

    /// Intersect a world-space ray against this geom, returning a hit with
    /// world-space normal/tangent. `pool` supplies triangle data for
    /// `TriangleMeshInstance`; ignored for analytic primitives.
    pub fn intersect(&self, world_ray: &Ray, pool: &TrianglePool, geom_id: u32) -> Option<Intersection> {
        let local_ray = Ray {
            o: self.transform.inv_transform_point(world_ray.o),
            d: self.transform.inv_transform_vector(world_ray.d),
            min_t: world_ray.min_t,
            max_t: world_ray.max_t,
        };

        let (t, local_normal, uv) = match self.kind {
            GeomKind::Sphere { radius } => intersect_sphere(&local_ray, radius)?,
            GeomKind::Cube { half_extent } => intersect_cube(&local_ray, half_extent)?,
            GeomKind::TriangleMeshInstance { first_triangle, num_triangles } => {
                intersect_mesh(&local_ray, pool, first_triangle, num_triangles)?
            }
        };

        let world_normal = self.transform.transform_normal(local_normal).normalized();
        let world_tangent = crate::math::basis_from_normal(world_normal).0;
        Some(Intersection {
            t,
            surface_normal: world_normal,
            surface_tangent: world_tangent,
            uv,
            material_id: self.material_id,
            geom_id,
        })
    }
}

fn transform_bounds(transform: &Transform, local: BBox) -> BBox {
    let mut bounds = BBox::empty();
    for i in 0..8 {
        let corner = Vec3::new(
            if i & 1 == 0 { local.min.x } else { local.max.x },
            if i & 2 == 0 { local.min.y } else { local.max.y },
            if i & 4 == 0 { local.min.z } else { local.max.z },
        );
        bounds = bounds.union_point(transform.transform_point(corner));
    }
    bounds
}

/// Quadratic-formula sphere intersection in object space, grounded on
/// `geometry::sphere::Sphere::intersect` (same `solve_quadratic` shape,
/// smaller-root-first then larger-root check).
fn intersect_sphere(ray: &Ray, radius: f32) -> Option<(f32, Vec3, (f32, f32))> {
    let a = dot(ray.d, ray.d);
    let b = 2.0 * dot(ray.d, ray.o);
    let c = dot(ray.o, ray.o) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let q = if b < 0.0 { -0.5 * (b - sqrt_disc) } else { -0.5 * (b + sqrt_disc) };
    let (mut t0, mut t1) = (q / a, c / q);
    if t0 > t1 {
        std::mem::swap(&mut t0, &mut t1);
    }
    let t = if t0 > ray.min_t && t0 < ray.max_t {
        t0
    } else if t1 > ray.min_t && t1 < ray.max_t {
        t1
    } else {
        return None;
    };

    let p = ray.at(t);
    let normal = p * (1.0 / radius);
    let phi = normal.z.atan2(normal.x);
    let theta = (normal.y / radius).clamp(-1.0, 1.0).acos();
    let uv = (phi / std::f32::consts::TAU + 0.5, theta / std::f32::consts::PI);
    Some((t, normal, uv))
}

/// Slab-test cube intersection in object space. The hit normal is the
/// unit axis vector of whichever slab produced the entering `t`.
fn intersect_cube(ray: &Ray, half_extent: f32) -> Option<(f32, Vec3, (f32, f32))> {
    let mut t0 = ray.min_t;
    let mut t1 = ray.max_t;
    let mut hit_axis = 0usize;
    let mut hit_sign = 1.0_f32;

    for axis in 0..3 {
        let inv_d = 1.0 / ray.d[axis];
        let mut t_near = (-half_extent - ray.o[axis]) * inv_d;
        let mut t_far = (half_extent - ray.o[axis]) * inv_d;
        let mut sign = -1.0_f32;
        if t_near > t_far {
            std::mem::swap(&mut t_near, &mut t_far);
            sign = 1.0;
        }
        if t_near > t0 {
            t0 = t_near;
            hit_axis = axis;
            hit_sign = sign;
        }
        t1 = t1.min(t_far);
        if t0 > t1 {
            return None;
        }
    }
    if t0 <= ray.min_t || t0 >= ray.max_t {
        return None;
    }

    let mut normal = Vec3::ZERO;
    normal[hit_axis] = hit_sign;
    let p = ray.at(t0);
    let uv = match hit_axis {
        0 => (p.y / (2.0 * half_extent) + 0.5, p.z / (2.0 * half_extent) + 0.5),
        1 => (p.x / (2.0 * half_extent) + 0.5, p.z / (2.0 * half_extent) + 0.5),
        _ => (p.x / (2.0 * half_extent) + 0.5, p.y / (2.0 * half_extent) + 0.5),
    };
    Some((t0, normal, uv))
}

fn intersect_mesh(
    ray: &Ray,
    pool: &TrianglePool,
    first_triangle: u32,
    num_triangles: u32,
) -> Option<(f32, Vec3, (f32, f32))> {
    let mut closest: Option<(f32, Vec3, (f32, f32))> = None;
    let mut near_ray = *ray;
    for tri in first_triangle..first_triangle + num_triangles {
        let (a, b, c) = pool.triangle(tri as usize);
        if let Some(hit) = intersect_triangle(&near_ray, &a, &b, &c) {
            near_ray.max_t = hit.t;
            closest = Some((hit.t, hit.normal, hit.uv));
        }
    }
    closest
}
