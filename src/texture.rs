//! Texture atlas and the environment map (§3, §9 "queried by direction").
//! A texture is a flat RGB buffer the shading step samples by nearest
//! lookup; per §9's resolved open question, the sampled value is returned
//! by value and kept local to the calling thread — it is never written
//! back into the shared `Material`/`Geom` record, avoiding the
//! cross-thread mutation race the spec calls out.

use crate::color::Color;
use crate::math::Vec3;
use std::f32::consts::{PI, TAU};

#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Texture {
    pub fn solid(color: Color) -> Texture {
        Texture { width: 1, height: 1, pixels: vec![color] }
    }

    /// Nearest-neighbor lookup; `uv` wraps.
    pub fn sample(&self, uv: (f32, f32)) -> Color {
        let u = uv.0.rem_euclid(1.0);
        let v = uv.1.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Lat-long (equirectangular) environment map, sampled for both ray-miss
/// lookups and cosine-weighted MIS light sampling (§3 supplemented
/// feature in `SPEC_FULL.md`).
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    pub texture: Texture,
}

impl EnvironmentMap {
    /// Radiance along a world-space direction, for a primary or bounce ray
    /// that left the scene without hitting anything.
    pub fn radiance(&self, dir: Vec3) -> Color {
        let d = dir.normalized();
        let u = d.z.atan2(d.x) / TAU + 0.5;
        let v = (d.y.clamp(-1.0, 1.0)).acos() / PI;
        self.texture.sample((u, v))
    }

    /// Inverse of `radiance`'s mapping, used to draw a direction for the
    /// environment's cosine-weighted-on-the-hemisphere-of-`n` light-sampling
    /// term (§4.E.2).
    pub fn direction_for_uv(u: f32, v: f32) -> Vec3 {
        let phi = (u - 0.5) * TAU;
        let theta = v * PI;
        Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_texture_returns_constant_color() {
        let tex = Texture::solid(Color::new(0.2, 0.4, 0.6));
        assert_eq!(tex.sample((0.1, 0.9)), Color::new(0.2, 0.4, 0.6));
        assert_eq!(tex.sample((1.3, -0.2)), Color::new(0.2, 0.4, 0.6));
    }
}
