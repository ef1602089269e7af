//! Error taxonomy (§7, `SPEC_FULL.md` §2): `thiserror` typed errors for the
//! two fatal conditions. Degenerate per-sample outcomes (zero pdf, wrong
//! hemisphere, NaN throughput) are deliberately not represented here — they
//! terminate one path silently, the way the teacher's own BSDF/light code
//! returns `Colorf::black()`/`None` instead of an `Err` for a single ray.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Raised by `RenderContext::init` when the scene fails validation
    /// (out-of-range material/geom indices, an empty k-d tree with
    /// non-empty geoms, a zero-size framebuffer). Fatal: the scene is
    /// left unconstructed and `init` must be retried with a fixed scene.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Raised when a render iteration cannot run (e.g. a prior iteration
    /// left a stale path array after the caller requested a resolution
    /// change without re-initializing). Fatal: the caller must `free()`
    /// and re-`init()` before rendering again.
    #[error("device launch failed: {0}")]
    DeviceLaunch(String),
}
