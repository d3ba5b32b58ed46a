use crate::splat::{
    cov_compensation, cov_to_conic, gaussian_exponent, splat_alpha, ALPHA_MIN,
    TRANSMITTANCE_MIN,
};

use super::batch::{BatchSlot, BatchView};

/// What happened to one candidate splat at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Degenerate exponent or alpha below one 8-bit step.
    Rejected,
    /// Blending would push transmittance to the saturation floor.
    Saturated,
    Blended,
}

/// Per-lane compositing state for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelAccumulator {
    pub pixel: [u32; 2],
    pub inside: bool,
    pub done: bool,
    pub color: [f32; 3],
    pub transmittance: f32,
    pub final_index: u32,
    pub contributions: u32,
}

impl Default for PixelAccumulator {
    fn default() -> Self {
        Self::new([0, 0], [0, 0], 0)
    }
}

impl PixelAccumulator {
    /// Out-of-bounds lanes start done; they still load batches for the group.
    pub fn new(pixel: [u32; 2], img_size: [u32; 2], range_end: u32) -> Self {
        let inside = pixel[0] < img_size[0] && pixel[1] < img_size[1];
        Self {
            pixel,
            inside,
            done: !inside,
            color: [0.0; 3],
            transmittance: 1.0,
            final_index: range_end,
            contributions: 0,
        }
    }

    pub fn pixel_center(&self) -> [f32; 2] {
        [self.pixel[0] as f32 + 0.5, self.pixel[1] as f32 + 0.5]
    }

    /// Applies one candidate at sorted position `index` under the over operator.
    pub fn blend(&mut self, index: u32, slot: &BatchSlot) -> Candidate {
        let conic = cov_to_conic(slot.cov);
        let compensation = cov_compensation(slot.cov);
        let center = self.pixel_center();
        let delta = [slot.xy[0] - center[0], slot.xy[1] - center[1]];
        let sigma = gaussian_exponent(conic, delta);
        let alpha = splat_alpha(slot.opacity, compensation, sigma);

        if sigma < 0.0 || alpha < ALPHA_MIN {
            return Candidate::Rejected;
        }

        let next_t = self.transmittance * (1.0 - alpha);
        if next_t <= TRANSMITTANCE_MIN {
            self.done = true;
            return Candidate::Saturated;
        }

        for (acc, c) in self.color.iter_mut().zip(slot.color) {
            *acc += c * alpha * self.transmittance;
        }
        self.transmittance = next_t;
        self.final_index = index;
        self.contributions += 1;
        Candidate::Blended
    }

    /// Walks the batch front to back until it runs out or the pixel saturates.
    /// Returns true when this call moved the lane to done.
    pub fn composite(&mut self, batch: &BatchView<'_>) -> bool {
        if self.done || batch.is_empty() {
            return false;
        }
        for (index, slot) in batch.iter() {
            if self.blend(index, slot) == Candidate::Saturated {
                return true;
            }
        }
        false
    }

    /// `(color + T * background, T)`.
    pub fn resolve(&self, background: [f32; 3]) -> [f32; 4] {
        let t = self.transmittance;
        [
            self.color[0] + t * background[0],
            self.color[1] + t * background[1],
            self.color[2] + t * background[2],
            t,
        ]
    }
}
