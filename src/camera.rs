//! Camera ray generation (§4.F.1): pinhole by default, thin-lens
//! depth-of-field when `lens_radius > 0`. Grounded on the teacher's
//! `camera::PerspectiveCamera::generate_ray_differential` — same
//! concentric-disk lens-sample-then-refocus construction, minus the ray
//! differentials (this engine has no texture filtering to drive with
//! them).

use crate::geometry::Ray;
use crate::math::{concentric_sample_disk, cross, next_2d, SmallRng, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub lens_radius: f32,
    pub focal_distance: f32,
    pub width: u32,
    pub height: u32,
}

impl Camera {
    pub fn new(eye: Vec3, look_at: Vec3, up_hint: Vec3, fov_y: f32, width: u32, height: u32) -> Camera {
        let forward = (look_at - eye).normalized();
        let right = cross(forward, up_hint).normalized();
        let up = cross(right, forward).normalized();
        Camera {
            eye,
            forward,
            up,
            right,
            fov_y,
            aspect: width as f32 / height as f32,
            lens_radius: 0.0,
            focal_distance: 1.0,
            width,
            height,
        }
    }

    #[must_use]
    pub fn with_lens(mut self, lens_radius: f32, focal_distance: f32) -> Camera {
        self.lens_radius = lens_radius;
        self.focal_distance = focal_distance;
        self
    }

    /// Build the primary ray through pixel `(px, py)` (top-left origin,
    /// §4 Open Questions). `jitter` is the sub-pixel offset in `[-.5,.5)^2`
    /// applied when anti-aliasing is on (zero otherwise, for first-bounce
    /// caching to be sound per §4.F.2.a). `lens_u` drives the thin-lens
    /// sample when `lens_radius > 0`.
    pub fn generate_ray(&self, px: u32, py: u32, jitter: (f32, f32), rng: &mut SmallRng) -> Ray {
        let half_h = (self.fov_y * 0.5).tan();
        let half_w = half_h * self.aspect;

        let u = ((px as f32 + 0.5 + jitter.0) / self.width as f32) * 2.0 - 1.0;
        let v = 1.0 - ((py as f32 + 0.5 + jitter.1) / self.height as f32) * 2.0;

        let dir = (self.forward + self.right * (u * half_w) + self.up * (v * half_h)).normalized();

        if self.lens_radius <= 0.0 {
            return Ray::new(self.eye, dir);
        }

        let focal_point = self.eye + dir * self.focal_distance;
        let (lx, ly) = concentric_sample_disk(next_2d(rng));
        let lens_offset = self.right * (lx * self.lens_radius) + self.up * (ly * self.lens_radius);
        let origin = self.eye + lens_offset;
        Ray::new(origin, (focal_point - origin).normalized())
    }
}
