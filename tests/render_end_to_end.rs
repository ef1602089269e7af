//! Crate-level tests exercising the public `init`/`renderIteration`/
//! `readFramebuffer` surface (§6) against a few of the testable properties
//! in `spec.md` §8: determinism per seed (§8.1), first-bounce cache
//! soundness (§8.5), and energy conservation on a non-emissive diffuse
//! scene (§8.3). These run a handful of small, fast iterations rather than
//! the spec's 5000-iteration end-to-end scenarios, which are a convergence
//! benchmark, not a unit test.

use aperture::color::Color;
use aperture::config::RenderConfig;
use aperture::geometry::Geom;
use aperture::integrator::IntegratorKind;
use aperture::material::Material;
use aperture::math::{Transform, Vec3};
use aperture::scene::Scene;
use aperture::RenderContext;

fn small_config() -> RenderConfig {
    RenderConfig {
        width: 16,
        height: 16,
        trace_depth: 4,
        samples_per_pixel: 1,
        anti_aliasing: false,
        lens_radius: 0.0,
        focal_distance: 1.0,
        first_bounce_cache: false,
        sort_by_material: false,
        russian_roulette: true,
        russian_roulette_threshold: 2,
        medium_enabled: false,
    }
}

/// A small closed box: a diffuse floor/back wall and a dim area light
/// overhead, viewed from a camera looking down the box.
fn cornell_like_scene() -> Scene {
    let camera = aperture::camera::Camera::new(
        Vec3::new(0.0, 2.0, -8.0),
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        16,
        16,
    );

    let floor = Geom::sphere(
        40.0,
        Transform::new(Vec3::new(0.0, -38.0, 0.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE),
        0,
    );
    let light = Geom::sphere(
        0.5,
        Transform::new(Vec3::new(0.0, 5.0, 0.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE),
        1,
    );

    let materials = vec![
        Material::Diffuse { albedo: Color::new(0.6, 0.5, 0.4) },
        Material::Emissive { emittance: Color::new(3.0, 3.0, 3.0) },
    ];

    Scene::new(camera, vec![floor, light], materials, aperture::geometry::TrianglePool::default())
}

#[test]
fn determinism_per_seed() {
    let config = small_config();
    let mut ctx_a = RenderContext::init(cornell_like_scene(), config.clone(), IntegratorKind::Full).unwrap();
    let mut ctx_b = RenderContext::init(cornell_like_scene(), config, IntegratorKind::Full).unwrap();

    for iter in 0..3 {
        ctx_a.render_iteration(iter).unwrap();
        ctx_b.render_iteration(iter).unwrap();
    }

    let a = ctx_a.read_framebuffer();
    let b = ctx_b.read_framebuffer();
    assert_eq!(a.len(), b.len());
    for (pa, pb) in a.iter().zip(b.iter()) {
        assert_eq!(pa, pb, "same seed/scene/flags must produce byte-identical accumulators");
    }
}

#[test]
fn first_bounce_cache_matches_uncached() {
    let mut cached_config = small_config();
    cached_config.first_bounce_cache = true;
    let mut uncached_config = small_config();
    uncached_config.first_bounce_cache = false;

    let mut ctx_cached = RenderContext::init(cornell_like_scene(), cached_config, IntegratorKind::Full).unwrap();
    let mut ctx_uncached = RenderContext::init(cornell_like_scene(), uncached_config, IntegratorKind::Full).unwrap();

    for iter in 0..3 {
        ctx_cached.render_iteration(iter).unwrap();
        ctx_uncached.render_iteration(iter).unwrap();
    }

    let cached = ctx_cached.read_framebuffer();
    let uncached = ctx_uncached.read_framebuffer();
    for (pc, pu) in cached.iter().zip(uncached.iter()) {
        assert_eq!(pc, pu, "enabling the first-bounce cache must not change the accumulator");
    }
}

#[test]
fn accumulator_never_contains_nan_or_negative_radiance() {
    let config = small_config();
    let mut ctx = RenderContext::init(cornell_like_scene(), config, IntegratorKind::Full).unwrap();

    for iter in 0..5 {
        ctx.render_iteration(iter).unwrap();
    }

    for pixel in ctx.read_framebuffer() {
        assert!(!pixel.has_nan(), "accumulator must never contain NaN (§7)");
        assert!(pixel.r >= 0.0 && pixel.g >= 0.0 && pixel.b >= 0.0, "radiance is never negative");
    }
}

#[test]
fn naive_integrator_never_exceeds_energy_conservation_bound() {
    // A closed, non-emissive albedo < 1 scene (environment off): the
    // per-channel accumulator must stay <= iteration count (§8.3) because
    // a diffuse bounce can only ever return a fraction of incoming energy.
    let camera = aperture::camera::Camera::new(
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        8,
        8,
    );
    let enclosing_sphere = Geom::sphere(50.0, Transform::identity(), 0);
    let dim_light = Geom::sphere(
        0.2,
        Transform::new(Vec3::new(0.0, 3.0, 0.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE),
        1,
    );
    let materials = vec![
        Material::Diffuse { albedo: Color::new(0.4, 0.4, 0.4) },
        Material::Emissive { emittance: Color::new(1.0, 1.0, 1.0) },
    ];
    let scene = Scene::new(camera, vec![enclosing_sphere, dim_light], materials, aperture::geometry::TrianglePool::default());

    let mut config = small_config();
    config.width = 8;
    config.height = 8;
    let mut ctx = RenderContext::init(scene, config, IntegratorKind::Naive).unwrap();

    let iterations = 20;
    for iter in 0..iterations {
        ctx.render_iteration(iter).unwrap();
    }

    // `read_framebuffer` reports the per-pixel mean (accumulator / iteration
    // count, see `Framebuffer::mean`), so §8.3's "accumulator <= iter" bound
    // is equivalent to "mean <= 1" here: a diffuse bounce with albedo < 1
    // can only return a fraction of what it received, and emittance is 1.
    for pixel in ctx.read_framebuffer() {
        assert!(pixel.r <= 1.0 + 1e-3, "channel exceeded energy-conservation bound: {:?}", pixel);
        assert!(pixel.g <= 1.0 + 1e-3, "channel exceeded energy-conservation bound: {:?}", pixel);
        assert!(pixel.b <= 1.0 + 1e-3, "channel exceeded energy-conservation bound: {:?}", pixel);
    }
}

#[test]
fn init_rejects_scene_with_no_lights_or_environment() {
    let camera = aperture::camera::Camera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0), 1.0, 8, 8);
    let geoms = vec![Geom::sphere(1.0, Transform::identity(), 0)];
    let materials = vec![Material::Diffuse { albedo: Color::WHITE }];
    let scene = Scene::new(camera, geoms, materials, aperture::geometry::TrianglePool::default());

    let mut config = small_config();
    config.width = 8;
    config.height = 8;
    let result = RenderContext::init(scene, config, IntegratorKind::Full);
    assert!(result.is_err(), "a scene with geoms but no lights/environment must fail init (§7)");
}
