//! Math & sampling primitives (§4.A): vector ops, affine transforms, the
//! per-invocation seeded RNG, and the sampling routines the BSDFs and light
//! sampler build on.

mod mat4;
mod rng;
mod sampling;
mod vec3;

pub use mat4::{Mat4, Transform};
pub use rng::{next_2d, next_f32, seeded_rng, SmallRng};
pub use sampling::*;
pub use vec3::{basis_from_normal, cross, dot, reflect, refract, Vec3};

pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

pub fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a * (1.0 - t) + b * t
}
