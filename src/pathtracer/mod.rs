//! The wavefront path tracer driver (§4.F) and the device memory
//! lifecycle (§4.K). Grounded on the teacher's `exec::MultiThreaded`: a
//! `scoped_threadpool::Pool` shared across iterations, chunked per-path
//! work instead of the teacher's per-block `BlockQueue`, since every path
//! here is independent within a stage (§5) rather than needing a shared
//! sampler per image tile.

mod segment;

pub use segment::PathSegment;

use log::{debug, info};
use scoped_threadpool::Pool;

use crate::camera::Camera;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::denoise::{self, DenoiseParams};
use crate::error::RenderError;
use crate::framebuffer::Framebuffer;
use crate::gbuffer::{encode_oct_normal, GBufferPixel};
use crate::geometry::{Geom, Intersection, TrianglePool};
use crate::integrator::{self, IntegratorKind, ShadeContext};
use crate::kdtree::{KdNode, KdTree};
use crate::light::{Light, LightSampler};
use crate::material::Material;
use crate::math::{next_f32, seeded_rng};
use crate::scene::Scene;
use crate::texture::{EnvironmentMap, Texture};

/// Cached depth-0 intersections, reused across iterations when §4.F.2.a's
/// first-bounce-cache preconditions hold (anti-aliasing and
/// depth-of-field both off, camera static). The G-buffer itself doesn't
/// need separate caching — it's written once into the framebuffer on the
/// iteration that populates this cache and stays valid while the camera
/// doesn't move.
struct FirstBounceCache {
    hits: Vec<Option<Intersection>>,
}

/// Owns every per-scene and per-framebuffer device array (§3
/// "Ownership", §4.K): geoms, materials, lights, k-d nodes, the shared
/// triangle pool, the environment map and textures, plus the
/// framebuffer. A single `init` builds it from a `Scene`; a single
/// `free` tears it down. Re-`init` after `free` requires a fresh `Scene`.
pub struct RenderContext {
    config: RenderConfig,
    integrator: IntegratorKind,
    camera: Camera,
    geoms: Vec<Geom>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    pool: TrianglePool,
    kd_nodes: Vec<KdNode>,
    kd_ordered_prims: Vec<u32>,
    environment: Option<EnvironmentMap>,
    #[allow(dead_code)]
    textures: Vec<Texture>,
    framebuffer: Framebuffer,
    thread_count: u32,
    first_bounce_cache: Option<FirstBounceCache>,
}

impl RenderContext {
    /// `init(scene)` (§6): validates the scene (§7 "Invalid scene at
    /// init") and allocates every per-scene and per-framebuffer array.
    /// The scene is consumed read-only; `RenderContext` owns the result.
    pub fn init(scene: Scene, config: RenderConfig, integrator: IntegratorKind) -> Result<RenderContext, RenderError> {
        scene.validate(config.width, config.height)?;
        let thread_count = num_cpus::get().max(1) as u32;
        info!(
            "init: {}x{} depth={} threads={} integrator={:?}",
            config.width, config.height, config.trace_depth, thread_count, integrator
        );
        let framebuffer = Framebuffer::new(config.width, config.height);
        Ok(RenderContext {
            config,
            integrator,
            camera: scene.camera,
            geoms: scene.geoms,
            materials: scene.materials,
            lights: scene.lights,
            pool: scene.pool,
            kd_nodes: scene.kd_nodes,
            kd_ordered_prims: scene.kd_ordered_prims,
            environment: scene.environment,
            textures: scene.textures,
            framebuffer,
            thread_count,
            first_bounce_cache: None,
        })
    }

    /// `free()` (§6): releases every device array. The context is left
    /// unusable; a fresh `init` is required to render again.
    pub fn free(mut self) {
        info!("free: releasing {} geoms, {} materials", self.geoms.len(), self.materials.len());
        self.geoms.clear();
        self.materials.clear();
        self.lights.clear();
        self.kd_nodes.clear();
        self.kd_ordered_prims.clear();
        self.textures.clear();
        self.environment = None;
        self.first_bounce_cache = None;
        self.framebuffer.reset();
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn iteration(&self) -> u32 {
        self.framebuffer.iteration()
    }

    /// `readFramebuffer()` (§6): a host-visible copy of the per-pixel mean
    /// radiance accumulated so far.
    pub fn read_framebuffer(&self) -> Vec<Color> {
        self.framebuffer.means()
    }

    /// `denoise(...)` (§6, §4.I): filters the current accumulator through
    /// the edge-aware wavelet filter, guided by the captured G-buffer.
    pub fn denoise(&self, sigma_c: f32, sigma_n: f32, sigma_p: f32, filter_size: u32) -> Vec<Color> {
        let params = DenoiseParams { sigma_c, sigma_n, sigma_p, filter_size };
        denoise::atrous_denoise(&self.framebuffer, &self.camera, params)
    }

    /// `renderIteration(iter)` (§6, §4.F): advances the accumulator by one
    /// sample per pixel. Re-entrant: call with increasing `iter` to keep
    /// accumulating.
    pub fn render_iteration(&mut self, iter: u32) -> Result<(), RenderError> {
        if self.geoms.is_empty() && self.lights.is_empty() && self.environment.is_none() {
            return Err(RenderError::DeviceLaunch("render context has no scene data".into()));
        }

        let pixel_count = (self.config.width * self.config.height) as usize;
        let use_cache = self.config.first_bounce_cache && !self.config.anti_aliasing && self.camera.lens_radius <= 0.0;

        let mut paths = self.generate_primary_rays(iter, pixel_count);

        let tree = KdTree {
            nodes: &self.kd_nodes,
            ordered_prims: &self.kd_ordered_prims,
            geoms: &self.geoms,
            pool: &self.pool,
        };
        let light_sampler = LightSampler {
            lights: &self.lights,
            geoms: &self.geoms,
            materials: &self.materials,
            pool: &self.pool,
            environment: self.environment.as_ref(),
        };
        let shade_ctx = ShadeContext {
            materials: &self.materials,
            geoms: &self.geoms,
            tree: &tree,
            lights: &light_sampler,
            environment: self.environment.as_ref(),
            config: &self.config,
        };

        for depth in 0..self.config.trace_depth {
            if paths.is_empty() {
                break;
            }

            let hits = if depth == 0 && use_cache && self.first_bounce_cache.is_some() {
                debug!("iter {}: reusing cached first-bounce intersections", iter);
                self.first_bounce_cache.as_ref().unwrap().hits.clone()
            } else {
                let hits = Self::intersect_all(&tree, &paths);
                if depth == 0 {
                    let gbuffer = Self::capture_gbuffer(&hits);
                    for (path, g) in paths.iter().zip(gbuffer.iter()) {
                        self.framebuffer.gbuffer[path.pixel_index as usize] = *g;
                    }
                    if use_cache {
                        self.first_bounce_cache = Some(FirstBounceCache { hits: hits.clone() });
                    }
                }
                hits
            };

            let (mut paths_sorted, hits_sorted) = if self.config.sort_by_material {
                Self::sort_by_material(paths, hits, &self.geoms)
            } else {
                (paths, hits)
            };

            Self::shade_all(self.integrator, self.thread_count, &shade_ctx, &mut paths_sorted, &hits_sorted, depth, iter);

            Self::finalize_terminated(&mut self.framebuffer, &paths_sorted);
            paths_sorted.retain(|p| p.is_alive());
            paths = paths_sorted;
        }

        // Any paths still alive after the depth budget are finalized too
        // (§4.F.2: the loop terminates after `traceDepth` bounces even if
        // Russian roulette never killed them).
        for path in &paths {
            if !path.color.has_nan() {
                self.framebuffer.accumulate(path.pixel_index as usize, path.color);
            }
        }

        self.framebuffer.finish_iteration();
        Ok(())
    }

    fn generate_primary_rays(&self, iter: u32, pixel_count: usize) -> Vec<PathSegment> {
        let width = self.config.width;
        let anti_aliasing = self.config.anti_aliasing;
        let trace_depth = self.config.trace_depth;
        let rr_threshold = self.config.russian_roulette_threshold;
        let camera = self.camera;

        let mut paths: Vec<PathSegment> = Vec::with_capacity(pixel_count);
        for pixel_index in 0..pixel_count {
            let px = (pixel_index as u32) % width;
            let py = (pixel_index as u32) / width;
            let mut rng = seeded_rng(iter, pixel_index as u32, 0);
            let jitter = if anti_aliasing {
                (next_f32(&mut rng) - 0.5, next_f32(&mut rng) - 0.5)
            } else {
                (0.0, 0.0)
            };
            let ray = camera.generate_ray(px, py, jitter, &mut rng);
            paths.push(PathSegment::new(ray, pixel_index as u32, trace_depth, rr_threshold));
        }
        paths
    }

    fn intersect_all(tree: &KdTree, paths: &[PathSegment]) -> Vec<Option<Intersection>> {
        paths.iter().map(|p| tree.intersect(&p.ray)).collect()
    }

    fn capture_gbuffer(hits: &[Option<Intersection>]) -> Vec<GBufferPixel> {
        hits.iter()
            .map(|hit| match hit {
                Some(h) => GBufferPixel { oct_normal: encode_oct_normal(h.surface_normal), depth: h.t },
                None => GBufferPixel::miss(),
            })
            .collect()
    }

    /// §4.F.2.b: sort the live path range by `material_id` so threads
    /// shading the same material execute together. Perf-only; the
    /// in-place `sort_by_key` keeps `(path, hit)` pairs together.
    fn sort_by_material(
        paths: Vec<PathSegment>,
        hits: Vec<Option<Intersection>>,
        geoms: &[Geom],
    ) -> (Vec<PathSegment>, Vec<Option<Intersection>>) {
        let mut combined: Vec<(PathSegment, Option<Intersection>)> = paths.into_iter().zip(hits).collect();
        combined.sort_by_key(|(_, hit)| match hit {
            Some(h) => geoms.get(h.geom_id as usize).map(|g| g.material_id).unwrap_or(u32::MAX),
            None => u32::MAX,
        });
        combined.into_iter().unzip()
    }

    fn shade_all(
        kind: IntegratorKind,
        thread_count: u32,
        ctx: &ShadeContext,
        paths: &mut [PathSegment],
        hits: &[Option<Intersection>],
        depth: u32,
        iter: u32,
    ) {
        let chunk_size = (paths.len() / thread_count.max(1) as usize).max(1);
        spawn_scoped(thread_count, paths, hits, chunk_size, |path, hit, local_index, chunk_start| {
            let path_index = (chunk_start + local_index) as u32;
            let mut rng = seeded_rng(iter, path_index, depth);
            integrator::shade(kind, ctx, path, hit, depth, &mut rng);
        });
    }

    /// §4.F.3: a path's `color` is final the moment `remaining_bounces`
    /// hits zero; scatter it into the accumulator right away rather than
    /// waiting for the whole depth loop to finish.
    fn finalize_terminated(framebuffer: &mut Framebuffer, paths: &[PathSegment]) {
        for path in paths {
            if !path.is_alive() && !path.color.has_nan() {
                framebuffer.accumulate(path.pixel_index as usize, path.color);
            }
        }
    }
}

/// Run `f` over `(path, hit)` pairs in disjoint chunks on a fresh
/// thread-pool (§5: workers are independent within a stage, synchronizing
/// only at the end of the launch). A short-lived pool is cheap next to
/// the per-pixel shading work it's dispatching and keeps `RenderContext`
/// free of a `Pool` field that would otherwise alias its own borrows.
fn spawn_scoped<F>(thread_count: u32, paths: &mut [PathSegment], hits: &[Option<Intersection>], chunk_size: usize, f: F)
where
    F: Fn(&mut PathSegment, Option<&Intersection>, usize, usize) + Sync,
{
    let mut pool = Pool::new(thread_count);
    pool.scoped(|scope| {
        for (chunk_index, (path_chunk, hit_chunk)) in paths.chunks_mut(chunk_size).zip(hits.chunks(chunk_size)).enumerate() {
            let chunk_start = chunk_index * chunk_size;
            let f = &f;
            scope.execute(move || {
                for (local_index, (path, hit)) in path_chunk.iter_mut().zip(hit_chunk.iter()).enumerate() {
                    f(path, hit.as_ref(), local_index, chunk_start);
                }
            });
        }
    });
}
