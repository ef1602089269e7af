//! The naive integrator (§4.G): emissive surfaces end the path, otherwise
//! scatter via the material's BSDF and continue. No explicit light
//! sampling — variance comes down only with more iterations.

use crate::geometry::Intersection;
use crate::material;
use crate::math::SmallRng;
use crate::pathtracer::PathSegment;

use super::ShadeContext;

pub fn shade_naive(ctx: &ShadeContext, path: &mut PathSegment, hit: Option<&Intersection>, rng: &mut SmallRng) {
    let Some(hit) = hit else {
        if let Some(env) = ctx.environment {
            path.color = path.color + path.throughput * env.radiance(path.ray.d);
        }
        path.remaining_bounces = 0;
        return;
    };

    let material = &ctx.materials[hit.material_id as usize];
    if material.is_emissive() {
        path.color = path.color + path.throughput * material.emitted();
        path.remaining_bounces = 0;
        return;
    }

    let hit_point = path.ray.at(hit.t);
    let wo = -path.ray.d;
    match material::scatter(hit_point, hit.surface_normal, wo, material, rng) {
        Some(result) => {
            path.ray = crate::geometry::Ray::new(result.new_origin, result.new_dir);
            path.throughput = path.throughput * result.throughput_factor;
            path.is_specular_bounce = result.specular_bounce;
            path.is_from_camera = false;
            path.remaining_bounces -= 1;
        }
        None => path.remaining_bounces = 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::RenderConfig;
    use crate::geometry::{Geom, TrianglePool};
    use crate::kdtree::{build_median_split, KdTree};
    use crate::light::{Light, LightSampler};
    use crate::material::Material;
    use crate::math::{seeded_rng, Transform, Vec3};

    #[test]
    fn emissive_hit_terminates_with_emission() {
        let geoms = vec![Geom::sphere(1.0, Transform::identity(), 0)];
        let materials = vec![Material::Emissive { emittance: Color::new(2.0, 2.0, 2.0) }];
        let pool = TrianglePool::default();
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let lights: Vec<Light> = Vec::new();
        let sampler = LightSampler { lights: &lights, geoms: &geoms, materials: &materials, pool: &pool, environment: None };
        let config = RenderConfig::default();
        let ctx = ShadeContext { materials: &materials, geoms: &geoms, tree: &tree, lights: &sampler, environment: None, config: &config };

        let mut path = PathSegment::new(crate::geometry::Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0)), 0, 8, 3);
        let hit = Intersection {
            t: 4.0,
            surface_normal: Vec3::new(0.0, 0.0, -1.0),
            surface_tangent: Vec3::new(1.0, 0.0, 0.0),
            uv: (0.0, 0.0),
            material_id: 0,
            geom_id: 0,
        };
        let mut rng = seeded_rng(0, 0, 0);
        shade_naive(&ctx, &mut path, Some(&hit), &mut rng);
        assert_eq!(path.remaining_bounces, 0);
        assert_eq!(path.color, Color::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn miss_with_no_environment_contributes_black() {
        let geoms: Vec<Geom> = Vec::new();
        let materials: Vec<Material> = Vec::new();
        let pool = TrianglePool::default();
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let lights: Vec<Light> = Vec::new();
        let sampler = LightSampler { lights: &lights, geoms: &geoms, materials: &materials, pool: &pool, environment: None };
        let config = RenderConfig::default();
        let ctx = ShadeContext { materials: &materials, geoms: &geoms, tree: &tree, lights: &sampler, environment: None, config: &config };

        let mut path = PathSegment::new(crate::geometry::Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)), 0, 8, 3);
        let mut rng = seeded_rng(0, 0, 0);
        shade_naive(&ctx, &mut path, None, &mut rng);
        assert_eq!(path.remaining_bounces, 0);
        assert_eq!(path.color, Color::BLACK);
    }
}
