//! Integrators (§4.G): the three policies for combining emission, direct
//! light and indirect bounces, dispatched over one `PathSegment` per
//! shading step. Grounded on the teacher's `integrator::{Path, Whitted}` —
//! same "emission then direct-light then continue" shape, generalized to
//! the three variants spec'd here rather than the teacher's single
//! min/max-depth path tracer.

mod direct;
mod full;
mod naive;

pub use direct::shade_direct_lighting;
pub use full::shade_full;
pub use naive::shade_naive;

use crate::config::RenderConfig;
use crate::geometry::Intersection;
use crate::kdtree::KdTree;
use crate::light::LightSampler;
use crate::material::Material;
use crate::math::SmallRng;
use crate::pathtracer::PathSegment;
use crate::texture::EnvironmentMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    /// §4.G "Naive": emission ends the path, otherwise scatter and
    /// continue. No explicit light sampling.
    Naive,
    /// §4.G "Direct-MIS": a one-bounce reference/debug integrator that
    /// always terminates after one direct-lighting estimate.
    DirectLighting,
    /// §4.G "Full": MIS direct lighting plus indirect continuation,
    /// guarded against double-counting emission via
    /// `is_from_camera`/`is_specular_bounce`.
    Full,
}

/// Shared context every integrator variant needs: the material/geom
/// tables to look up the hit surface, the light sampler for the direct
/// term, the k-d tree for BSDF-sampling shadow/continuation rays, and the
/// environment map for ray misses.
pub struct ShadeContext<'a> {
    pub materials: &'a [Material],
    pub geoms: &'a [crate::geometry::Geom],
    pub tree: &'a KdTree<'a>,
    pub lights: &'a LightSampler<'a>,
    pub environment: Option<&'a EnvironmentMap>,
    pub config: &'a RenderConfig,
}

/// Shade one live path at one depth step (§4.F.2.c): dispatches to the
/// configured integrator. `hit` is `None` on a ray miss.
pub fn shade(
    kind: IntegratorKind,
    ctx: &ShadeContext,
    path: &mut PathSegment,
    hit: Option<&Intersection>,
    depth: u32,
    rng: &mut SmallRng,
) {
    if path.throughput.has_nan() || path.color.has_nan() {
        // §7 "Degenerate sample": never propagate NaN further.
        path.remaining_bounces = 0;
        return;
    }
    match kind {
        IntegratorKind::Naive => shade_naive(ctx, path, hit, rng),
        IntegratorKind::DirectLighting => shade_direct_lighting(ctx, path, hit, depth, rng),
        IntegratorKind::Full => shade_full(ctx, path, hit, depth, rng),
    }
}
