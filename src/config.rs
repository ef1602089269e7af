//! Render configuration (`SPEC_FULL.md` §2). Plain serde-serializable
//! data, the way the teacher's scene JSON types (`FrameInfo` and friends)
//! are — a config file or CLI flag layer can deserialize this directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub trace_depth: u32,
    /// Informational: the driver's `render_iteration` is called once per
    /// iteration by the caller, so this isn't consumed by the driver
    /// itself, but by whatever loop decides when to stop.
    pub samples_per_pixel: u32,
    pub anti_aliasing: bool,
    pub lens_radius: f32,
    pub focal_distance: f32,
    /// §4.F.2.a: only sound when `anti_aliasing` is off and the camera is
    /// static across iterations.
    pub first_bounce_cache: bool,
    /// §4.F.2.b: perf-only, correctness-preserving.
    pub sort_by_material: bool,
    pub russian_roulette: bool,
    /// Depth at which Russian roulette starts being considered, per §4.G.
    pub russian_roulette_threshold: u32,
    /// Runtime companion to the `sub_scattering` compile-time feature:
    /// lets a binary built with the feature still disable the medium at
    /// runtime for a given scene.
    pub medium_enabled: bool,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: 800,
            height: 600,
            trace_depth: 8,
            samples_per_pixel: 256,
            anti_aliasing: true,
            lens_radius: 0.0,
            focal_distance: 1.0,
            first_bounce_cache: false,
            sort_by_material: false,
            russian_roulette: true,
            russian_roulette_threshold: 5, // trace_depth - 3, per §3
            medium_enabled: false,
        }
    }
}
