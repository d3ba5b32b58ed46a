use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use crate::math::{hsv_to_rgb, rotated_covariance};
use crate::splat::{ProjectedSplats, COV_BLUR};

/// Projected splats plus the view depth of each, ready for binning.
#[derive(Debug, Clone, Default)]
pub struct DemoScene {
    pub splats: ProjectedSplats,
    pub depths: Vec<f32>,
}

impl DemoScene {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            splats: ProjectedSplats::with_capacity(capacity),
            depths: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, xy: [f32; 2], depth: f32, cov: [f32; 3], color: [f32; 3], opacity: f32) {
        let cov = [cov[0] + COV_BLUR, cov[1], cov[2] + COV_BLUR];
        self.splats.push(xy, cov, color, opacity);
        self.depths.push(depth);
    }
}

// --- Demo splat generators ---

fn push_torus_knot(scene: &mut DemoScene, rng: &mut StdRng, count: usize, img_size: [u32; 2]) {
    let p = 2.0;
    let q = 3.0;
    let half = [img_size[0] as f32 * 0.5, img_size[1] as f32 * 0.5];
    let major = half[0].min(half[1]) * 0.55;
    let minor = major * 0.27;
    let px_scale = major / 60.0;

    for i in 0..count {
        let t = i as f32 / count.max(1) as f32 * TAU * 2.0;
        let ring = major + minor * (q * t).cos();
        let x = half[0] + ring * (p * t).cos();
        let y = half[1] + ring * (p * t).sin();
        // The knot's out-of-plane coordinate becomes view depth.
        let depth = 5.0 + minor * (q * t).sin() / major;

        let jitter = [
            rng.random_range(-1.5_f32..1.5_f32) * px_scale,
            rng.random_range(-1.5_f32..1.5_f32) * px_scale,
        ];

        let hue = ((q * t).sin() * 0.5 + 0.5) * 360.0;
        let sx = rng.random_range(1.2_f32..3.0_f32) * px_scale;
        let sy = sx * rng.random_range(0.4_f32..1.0_f32);
        let cov = rotated_covariance(sx, sy, (p * t) + std::f32::consts::FRAC_PI_2);

        scene.push(
            [x + jitter[0], y + jitter[1]],
            depth,
            cov,
            hsv_to_rgb(hue, 0.80, 0.95),
            rng.random_range(0.68_f32..0.95_f32),
        );
    }
}

fn push_clusters(scene: &mut DemoScene, rng: &mut StdRng, count: usize, img_size: [u32; 2]) {
    let w = img_size[0] as f32;
    let h = img_size[1] as f32;
    let centers = [
        [0.18 * w, 0.22 * h, 6.5],
        [0.82 * w, 0.25 * h, 4.0],
        [0.20 * w, 0.80 * h, 3.5],
        [0.80 * w, 0.78 * h, 7.0],
    ];
    let palette = [
        [1.00, 0.47, 0.31],
        [0.39, 0.82, 1.00],
        [0.63, 1.00, 0.51],
        [1.00, 0.86, 0.35],
    ];
    let spread = w.min(h) * 0.12;

    for i in 0..count {
        let cluster = i % centers.len();
        let [cx, cy, cz] = centers[cluster];
        let base = palette[cluster];

        let angle = rng.random_range(0.0_f32..TAU);
        let radius = rng.random::<f32>().sqrt() * spread;
        let color = base.map(|c: f32| (c + rng.random_range(-0.1_f32..0.1_f32)).clamp(0.0, 1.0));

        let s = rng.random_range(0.6_f32..2.5_f32) * spread / 24.0;
        let cov = rotated_covariance(s, s * rng.random_range(0.7_f32..1.3_f32), angle);
        scene.push(
            [cx + radius * angle.cos(), cy + radius * angle.sin()],
            cz + rng.random_range(-0.5_f32..0.5_f32),
            cov,
            color,
            rng.random_range(0.60_f32..0.95_f32),
        );
    }
}

/// Seeded scene: two thirds torus knot, one third colored clusters.
pub fn generate_demo_splats(count: usize, seed: u64, img_size: [u32; 2]) -> DemoScene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = DemoScene::with_capacity(count);
    let knot = count * 2 / 3;
    push_torus_knot(&mut scene, &mut rng, knot, img_size);
    push_clusters(&mut scene, &mut rng, count - knot, img_size);
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_seeded() {
        let a = generate_demo_splats(300, 7, [64, 48]);
        let b = generate_demo_splats(300, 7, [64, 48]);
        assert_eq!(a.splats, b.splats);
        assert_eq!(a.depths, b.depths);
        assert_eq!(a.splats.len(), 300);
        assert!(a.splats.is_consistent());
    }

    #[test]
    fn demo_covariances_are_positive_definite() {
        let scene = generate_demo_splats(200, 1, [128, 128]);
        for cov in &scene.splats.cov2ds {
            assert!(cov[0] > 0.0 && cov[2] > 0.0);
            assert!(cov[0] * cov[2] - cov[1] * cov[1] > 0.0);
        }
    }
}
