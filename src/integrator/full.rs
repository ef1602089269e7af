//! The full integrator (§4.G): combines MIS direct lighting with an
//! indirect continuation, guarding against double-counting emission that
//! was already gathered as a direct-lighting term at the previous hit.
//! Russian roulette (§4.G.iv) kicks in once `remaining_bounces` drops
//! below `russian_roulette_threshold`.

use crate::geometry::Intersection;
use crate::material;
use crate::math::{next_f32, SmallRng};
use crate::pathtracer::PathSegment;

use super::ShadeContext;

pub fn shade_full(ctx: &ShadeContext, path: &mut PathSegment, hit: Option<&Intersection>, depth: u32, rng: &mut SmallRng) {
    let camera_or_specular = path.is_from_camera || path.is_specular_bounce;

    let Some(hit) = hit else {
        if camera_or_specular {
            if let Some(env) = ctx.environment {
                path.color = path.color + path.throughput * env.radiance(path.ray.d);
            }
        }
        path.remaining_bounces = 0;
        return;
    };

    let material = &ctx.materials[hit.material_id as usize];
    if material.is_emissive() {
        if camera_or_specular {
            path.color = path.color + path.throughput * material.emitted();
        }
        path.remaining_bounces = 0;
        return;
    }

    let hit_point = path.ray.at(hit.t);
    let wo = -path.ray.d;

    let ld = ctx.lights.sample_uniform_light(ctx.tree, hit_point, hit, wo, material, rng);
    path.color = path.color + path.throughput * ld;

    match material::scatter(hit_point, hit.surface_normal, wo, material, rng) {
        Some(result) => {
            path.ray = crate::geometry::Ray::new(result.new_origin, result.new_dir);
            path.throughput = path.throughput * result.throughput_factor;
            path.is_specular_bounce = result.specular_bounce;
            path.is_from_camera = false;
            path.remaining_bounces -= 1;
        }
        None => {
            path.remaining_bounces = 0;
            return;
        }
    }

    if ctx.config.russian_roulette && path.remaining_bounces < path.russian_roulette_threshold {
        let q = path.throughput.max_component().clamp(0.05, 1.0);
        if next_f32(rng) > q {
            path.remaining_bounces = 0;
        } else {
            path.throughput = path.throughput / q;
        }
    }

    let _ = depth;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::RenderConfig;
    use crate::geometry::{Geom, TrianglePool};
    use crate::kdtree::{build_median_split, KdTree};
    use crate::light::{Light, LightKind, LightSampler};
    use crate::material::Material;
    use crate::math::{seeded_rng, Transform, Vec3};

    fn cornell_like() -> (Vec<Geom>, Vec<Material>) {
        let geoms = vec![
            Geom::sphere(1.0, Transform::new(Vec3::new(0.0, -2.0, 0.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::broadcast(3.0)), 0),
            Geom::sphere(0.3, Transform::new(Vec3::new(0.0, 3.0, 0.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE), 1),
        ];
        let materials = vec![
            Material::Diffuse { albedo: Color::new(0.8, 0.8, 0.8) },
            Material::Emissive { emittance: Color::new(5.0, 5.0, 5.0) },
        ];
        (geoms, materials)
    }

    #[test]
    fn non_camera_emissive_hit_is_not_double_counted() {
        let (geoms, materials) = cornell_like();
        let pool = TrianglePool::default();
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let lights = vec![Light { kind: LightKind::Area { geom_id: 1 } }];
        let sampler = LightSampler { lights: &lights, geoms: &geoms, materials: &materials, pool: &pool, environment: None };
        let config = RenderConfig::default();
        let ctx = ShadeContext { materials: &materials, geoms: &geoms, tree: &tree, lights: &sampler, environment: None, config: &config };

        let mut path = PathSegment::new(crate::geometry::Ray::new(Vec3::new(0.0, 0.5, -5.0), Vec3::new(0.0, 0.0, 1.0)), 0, 8, 3);
        path.is_from_camera = false;
        path.is_specular_bounce = false;
        let hit = Intersection {
            t: 2.5,
            surface_normal: Vec3::new(0.0, -1.0, 0.0),
            surface_tangent: Vec3::new(1.0, 0.0, 0.0),
            uv: (0.0, 0.0),
            material_id: 1,
            geom_id: 1,
        };
        let mut rng = seeded_rng(0, 0, 1);
        shade_full(&ctx, &mut path, Some(&hit), 1, &mut rng);
        assert_eq!(path.color, Color::BLACK);
        assert_eq!(path.remaining_bounces, 0);
    }

    #[test]
    fn camera_ray_hitting_light_directly_counts_emission() {
        let (geoms, materials) = cornell_like();
        let pool = TrianglePool::default();
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let lights = vec![Light { kind: LightKind::Area { geom_id: 1 } }];
        let sampler = LightSampler { lights: &lights, geoms: &geoms, materials: &materials, pool: &pool, environment: None };
        let config = RenderConfig::default();
        let ctx = ShadeContext { materials: &materials, geoms: &geoms, tree: &tree, lights: &sampler, environment: None, config: &config };

        let mut path = PathSegment::new(crate::geometry::Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 1.0, 0.0).normalized()), 0, 8, 3);
        assert!(path.is_from_camera);
        let hit = Intersection {
            t: 5.3,
            surface_normal: Vec3::new(0.0, -1.0, 0.0),
            surface_tangent: Vec3::new(1.0, 0.0, 0.0),
            uv: (0.0, 0.0),
            material_id: 1,
            geom_id: 1,
        };
        let mut rng = seeded_rng(0, 0, 0);
        shade_full(&ctx, &mut path, Some(&hit), 0, &mut rng);
        assert_eq!(path.color, Color::new(5.0, 5.0, 5.0));
    }
}
