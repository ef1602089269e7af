//! Light sampling & MIS (§4.E), grounded on the teacher's
//! `integrator::{sample_one_light, estimate_direct}`: pick a light, sample
//! it directly, sample the BSDF, combine both techniques with the power
//! heuristic. `estimate_direct` there also does the "did the BSDF ray
//! re-hit the same light" check via `std::ptr::eq`; here geoms are stored
//! by index so the equivalent check is `hit.geom_id == light_geom_id`.

use crate::color::Color;
use crate::geometry::{Geom, GeomKind, Intersection, TrianglePool};
use crate::kdtree::KdTree;
use crate::material::{bsdf_eval, bsdf_pdf, Material};
use crate::math::{
    area_pdf_to_solid_angle, dot, next_2d, next_f32, power_heuristic, uniform_sample_sphere, uniform_sample_triangle,
    SmallRng, Vec3,
};
use crate::texture::EnvironmentMap;

#[derive(Debug, Clone, Copy)]
pub enum LightKind {
    Area { geom_id: u32 },
    Environment,
}

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub kind: LightKind,
}

fn geom_area(geom: &Geom, pool: &TrianglePool) -> f32 {
    match geom.kind {
        GeomKind::Sphere { radius } => {
            let scale = geom.transform.transform_vector(Vec3::new(1.0, 0.0, 0.0)).length();
            4.0 * std::f32::consts::PI * radius * radius * scale * scale
        }
        GeomKind::Cube { half_extent } => {
            let s = geom.transform.transform_vector(Vec3::new(1.0, 0.0, 0.0)).length();
            let side = 2.0 * half_extent * s;
            6.0 * side * side
        }
        GeomKind::TriangleMeshInstance { first_triangle, num_triangles } => {
            let mut area = 0.0;
            for i in first_triangle..first_triangle + num_triangles {
                let (a, b, c) = pool.triangle(i as usize);
                let wa = geom.transform.transform_point(a.position);
                let wb = geom.transform.transform_point(b.position);
                let wc = geom.transform.transform_point(c.position);
                area += 0.5 * crate::math::cross(wb - wa, wc - wa).length();
            }
            area
        }
    }
}

/// Sample a uniformly-random point on `geom`'s surface, in world space.
fn sample_area_geom(geom: &Geom, pool: &TrianglePool, u: (f32, f32)) -> (Vec3, Vec3) {
    match geom.kind {
        GeomKind::Sphere { radius } => {
            let local = uniform_sample_sphere(u) * radius;
            let world_p = geom.transform.transform_point(local);
            let world_n = geom.transform.transform_normal(local.normalized()).normalized();
            (world_p, world_n)
        }
        GeomKind::Cube { half_extent } => {
            let face = (u.0 * 6.0) as usize % 6;
            let a = (u.0 * 6.0).fract();
            let b = u.1;
            let e = half_extent;
            let (local_p, local_n) = match face {
                0 => (Vec3::new(e, (2.0 * a - 1.0) * e, (2.0 * b - 1.0) * e), Vec3::new(1.0, 0.0, 0.0)),
                1 => (Vec3::new(-e, (2.0 * a - 1.0) * e, (2.0 * b - 1.0) * e), Vec3::new(-1.0, 0.0, 0.0)),
                2 => (Vec3::new((2.0 * a - 1.0) * e, e, (2.0 * b - 1.0) * e), Vec3::new(0.0, 1.0, 0.0)),
                3 => (Vec3::new((2.0 * a - 1.0) * e, -e, (2.0 * b - 1.0) * e), Vec3::new(0.0, -1.0, 0.0)),
                4 => (Vec3::new((2.0 * a - 1.0) * e, (2.0 * b - 1.0) * e, e), Vec3::new(0.0, 0.0, 1.0)),
                _ => (Vec3::new((2.0 * a - 1.0) * e, (2.0 * b - 1.0) * e, -e), Vec3::new(0.0, 0.0, -1.0)),
            };
            let world_p = geom.transform.transform_point(local_p);
            let world_n = geom.transform.transform_normal(local_n).normalized();
            (world_p, world_n)
        }
        GeomKind::TriangleMeshInstance { first_triangle, num_triangles } => {
            let tri = first_triangle + ((u.0 * num_triangles as f32) as u32).min(num_triangles - 1);
            let (a, b, c) = pool.triangle(tri as usize);
            let (ba, bb) = uniform_sample_triangle(((u.0 * num_triangles as f32).fract(), u.1));
            let bc = 1.0 - ba - bb;
            let local_p = a.position * ba + b.position * bb + c.position * bc;
            let local_n = a.normal * ba + b.normal * bb + c.normal * bc;
            let world_p = geom.transform.transform_point(local_p);
            let world_n = geom.transform.transform_normal(local_n).normalized();
            (world_p, world_n)
        }
    }
}

pub struct LightSampler<'a> {
    pub lights: &'a [Light],
    pub geoms: &'a [Geom],
    pub materials: &'a [Material],
    pub pool: &'a TrianglePool,
    pub environment: Option<&'a EnvironmentMap>,
}

impl<'a> LightSampler<'a> {
    /// `sampleUniformLight` (§4.E): picks one light uniformly, evaluates
    /// both the light-sampling and BSDF-sampling terms, and combines them
    /// with the power heuristic. Returns black for a pure specular
    /// material — those defer direct lighting to the next bounce.
    pub fn sample_uniform_light(
        &self,
        tree: &KdTree,
        point: Vec3,
        isect: &Intersection,
        wo: Vec3,
        material: &Material,
        rng: &mut SmallRng,
    ) -> Color {
        if material.is_specular() || self.lights.is_empty() {
            return Color::BLACK;
        }

        let n_l = self.lights.len() as f32;
        let pick = (next_f32(rng) * self.lights.len() as f32) as usize;
        let pick = pick.min(self.lights.len() - 1);
        let light = &self.lights[pick];

        let light_term = self.light_sampling_term(tree, point, isect, wo, material, light, rng);
        let bsdf_term = self.bsdf_sampling_term(tree, point, isect, wo, material, light, rng);

        (light_term + bsdf_term) * n_l
    }

    fn emitted_from_geom(&self, geom_id: u32) -> Color {
        let geom = &self.geoms[geom_id as usize];
        self.materials[geom.material_id as usize].emitted()
    }

    fn light_sampling_term(
        &self,
        tree: &KdTree,
        point: Vec3,
        isect: &Intersection,
        wo: Vec3,
        material: &Material,
        light: &Light,
        rng: &mut SmallRng,
    ) -> Color {
        let u = next_2d(rng);
        let (wi, le, pdf_light) = match light.kind {
            LightKind::Area { geom_id } => {
                let geom = &self.geoms[geom_id as usize];
                let (sample_p, sample_n) = sample_area_geom(geom, self.pool, u);
                let to_light = sample_p - point;
                let dist_sqr = to_light.length_sqr();
                if dist_sqr < 1e-12 {
                    return Color::BLACK;
                }
                let dist = dist_sqr.sqrt();
                let wi = to_light / dist;
                let cos_theta_light = dot(sample_n, -wi);
                if cos_theta_light <= 0.0 {
                    return Color::BLACK;
                }
                let area = geom_area(geom, self.pool);
                if area <= 0.0 {
                    return Color::BLACK;
                }
                let pdf_area = area_pdf_to_solid_angle(1.0 / area, dist_sqr, cos_theta_light);

                let mut shadow_ray = crate::geometry::Ray::spawn(point, wi, isect.surface_normal.face_forward(wi));
                shadow_ray.max_t = dist - crate::geometry::RAY_EPSILON * 2.0;
                if tree.intersect_any(&shadow_ray) {
                    return Color::BLACK;
                }
                (wi, self.emitted_from_geom(geom_id), pdf_area)
            }
            LightKind::Environment => {
                let Some(env) = self.environment else { return Color::BLACK };
                let (local_dir, cos_pdf) = crate::math::cosine_sample_hemisphere(u);
                let (tangent, bitangent) = crate::math::basis_from_normal(isect.surface_normal);
                let wi = tangent * local_dir.x + bitangent * local_dir.y + isect.surface_normal * local_dir.z;
                if cos_pdf <= 0.0 {
                    return Color::BLACK;
                }
                let shadow_ray = crate::geometry::Ray::spawn(point, wi, isect.surface_normal);
                if tree.intersect_any(&shadow_ray) {
                    return Color::BLACK;
                }
                (wi, env.radiance(wi), cos_pdf)
            }
        };

        if pdf_light <= 0.0 {
            return Color::BLACK;
        }
        let f = bsdf_eval(material, isect.surface_normal, wo, wi);
        if f.is_black() {
            return Color::BLACK;
        }
        let pdf_bsdf = bsdf_pdf(material, isect.surface_normal, wo, wi);
        let weight = power_heuristic(1.0, pdf_light, 1.0, pdf_bsdf);
        let cos_theta = dot(wi, isect.surface_normal).abs();
        f * le * (weight * cos_theta / pdf_light)
    }

    fn bsdf_sampling_term(
        &self,
        tree: &KdTree,
        point: Vec3,
        isect: &Intersection,
        wo: Vec3,
        material: &Material,
        light: &Light,
        rng: &mut SmallRng,
    ) -> Color {
        let Some(scatter) = crate::material::scatter(point, isect.surface_normal, wo, material, rng) else {
            return Color::BLACK;
        };
        let pdf_bsdf = bsdf_pdf(material, isect.surface_normal, wo, scatter.new_dir);
        if pdf_bsdf <= 0.0 {
            return Color::BLACK;
        }
        let wi = scatter.new_dir;
        let mut ray = crate::geometry::Ray::new(scatter.new_origin, wi);
        ray.min_t = 0.0;

        let hit = tree.intersect(&ray);
        let (le, pdf_light) = match (light.kind, &hit) {
            (LightKind::Area { geom_id }, Some(h)) if h.geom_id == geom_id => {
                let geom = &self.geoms[geom_id as usize];
                let dist_sqr = (point - ray.at(h.t)).length_sqr();
                let cos_theta_light = dot(h.surface_normal, -wi).abs();
                let area = geom_area(geom, self.pool);
                if area <= 0.0 {
                    return Color::BLACK;
                }
                let pdf_light = area_pdf_to_solid_angle(1.0 / area, dist_sqr, cos_theta_light);
                (self.emitted_from_geom(geom_id), pdf_light)
            }
            (LightKind::Environment, None) => {
                let Some(env) = self.environment else { return Color::BLACK };
                let cos_pdf = crate::math::cosine_hemisphere_pdf(dot(wi, isect.surface_normal));
                (env.radiance(wi), cos_pdf)
            }
            _ => return Color::BLACK,
        };

        if pdf_light <= 0.0 {
            return Color::BLACK;
        }
        let f = bsdf_eval(material, isect.surface_normal, wo, wi);
        let weight = power_heuristic(1.0, pdf_bsdf, 1.0, pdf_light);
        let cos_theta = dot(wi, isect.surface_normal).abs();
        f * le * (weight * cos_theta / pdf_bsdf)
    }
}
