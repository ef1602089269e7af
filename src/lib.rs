//! Ray-batch path tracing engine and edge-aware A-Trous denoiser.
//!
//! This crate is the core described in `SPEC_FULL.md`: the wavefront path
//! tracer driver, the k-d tree traversal it uses for intersection, the BSDF
//! and light-sampling machinery that drives shading, the G-buffer captured
//! at the primary hit, and the denoiser that consumes it. Scene-file
//! parsing, the k-d tree *builder*, asset loading, and the display/GUI path
//! are external collaborators (see `scene::Scene` for the host-data surface
//! this crate expects to be handed).

#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod camera;
pub mod color;
pub mod config;
pub mod denoise;
pub mod error;
pub mod framebuffer;
pub mod gbuffer;
pub mod geometry;
pub mod integrator;
pub mod kdtree;
pub mod light;
pub mod material;
pub mod math;
#[cfg(feature = "sub_scattering")]
pub mod medium;
pub mod pathtracer;
pub mod scene;
pub mod texture;

pub use config::RenderConfig;
pub use error::RenderError;
pub use pathtracer::RenderContext;
