//! The direct-lighting-with-MIS integrator (§4.G "Direct-MIS"): a
//! reference/debug integrator. Emission is only counted at the primary
//! hit; every other hit is a single MIS direct-lighting estimate and the
//! path always terminates after one bounce.

use crate::geometry::Intersection;
use crate::math::SmallRng;
use crate::pathtracer::PathSegment;

use super::ShadeContext;

pub fn shade_direct_lighting(
    ctx: &ShadeContext,
    path: &mut PathSegment,
    hit: Option<&Intersection>,
    depth: u32,
    rng: &mut SmallRng,
) {
    let Some(hit) = hit else {
        if depth == 0 {
            if let Some(env) = ctx.environment {
                path.color = path.color + path.throughput * env.radiance(path.ray.d);
            }
        }
        path.remaining_bounces = 0;
        return;
    };

    let material = &ctx.materials[hit.material_id as usize];
    if material.is_emissive() {
        if depth == 0 {
            path.color = path.color + path.throughput * material.emitted();
        }
        path.remaining_bounces = 0;
        return;
    }

    let hit_point = path.ray.at(hit.t);
    let wo = -path.ray.d;
    let ld = ctx.lights.sample_uniform_light(ctx.tree, hit_point, hit, wo, material, rng);
    path.color = path.color + path.throughput * ld;
    path.remaining_bounces = 0;
}
