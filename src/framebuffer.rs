//! The radiance accumulator and its ping-pong scratch images (§4.J, §4.K).
//! The accumulator sums radiance across iterations without tone mapping
//! or clamping; display divides by iteration count and clamps to
//! `[0,255]` per channel after `*255`, the way the teacher's
//! `RenderTarget`/`FrameInfo` pair separates "what's accumulated" from
//! "what's displayed".

use crate::color::Color;
use crate::gbuffer::GBufferPixel;

pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    accumulator: Vec<Color>,
    pub gbuffer: Vec<GBufferPixel>,
    iteration: u32,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Framebuffer {
        let len = (width * height) as usize;
        Framebuffer {
            width,
            height,
            accumulator: vec![Color::BLACK; len],
            gbuffer: vec![GBufferPixel::miss(); len],
            iteration: 0,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.accumulator.len()
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Scatter-add `color` into the accumulator at `pixel_index` (§4.F.3).
    /// Distinct `pixel_index`s are written concurrently by the driver's
    /// thread pool; this method only touches its own slot.
    pub fn accumulate(&mut self, pixel_index: usize, color: Color) {
        self.accumulator[pixel_index] = self.accumulator[pixel_index] + color;
    }

    pub fn finish_iteration(&mut self) {
        self.iteration += 1;
    }

    /// Mean radiance at `pixel_index`, the per-pixel mean the denoiser and
    /// display both read.
    pub fn mean(&self, pixel_index: usize) -> Color {
        if self.iteration == 0 {
            Color::BLACK
        } else {
            self.accumulator[pixel_index] / self.iteration as f32
        }
    }

    pub fn means(&self) -> Vec<Color> {
        (0..self.accumulator.len()).map(|i| self.mean(i)).collect()
    }

    /// Tone-map the current mean radiance to 8-bit sRGB for display (§4.J).
    pub fn to_srgb8(&self) -> Vec<[u8; 3]> {
        self.means()
            .iter()
            .map(|c| {
                let srgb = c.clamp(0.0, 1.0).to_srgb();
                [
                    (srgb.r * 255.0).round() as u8,
                    (srgb.g * 255.0).round() as u8,
                    (srgb.b * 255.0).round() as u8,
                ]
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.accumulator.iter_mut().for_each(|c| *c = Color::BLACK);
        self.gbuffer.iter_mut().for_each(|p| *p = GBufferPixel::miss());
        self.iteration = 0;
    }
}
