use crate::math::{det_2x2, max_eigenvalue};

/// Regularisation the projection stage adds to every 2D covariance diagonal.
pub const COV_BLUR: f32 = 0.3;
/// Upper bound on a single splat's alpha.
pub const ALPHA_MAX: f32 = 0.99;
/// Contributions below one 8-bit step are dropped.
pub const ALPHA_MIN: f32 = 1.0 / 255.0;
/// A pixel whose transmittance would fall to this value is saturated.
pub const TRANSMITTANCE_MIN: f32 = 1e-4;
pub const GAUSSIAN_SIGMA_CUTOFF: f32 = 3.0;

/// Projected splats in structure-of-arrays layout, indexed by splat id.
///
/// Covariances are `(xx, xy, yy, _)` and colors `(r, g, b, _)`, both padded to
/// four floats so the arrays can be uploaded to a GPU as `vec4<f32>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedSplats {
    pub xys: Vec<[f32; 2]>,
    pub cov2ds: Vec<[f32; 4]>,
    pub colors: Vec<[f32; 4]>,
    pub opacity: Vec<f32>,
}

impl ProjectedSplats {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            xys: Vec::with_capacity(capacity),
            cov2ds: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            opacity: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, xy: [f32; 2], cov: [f32; 3], color: [f32; 3], opacity: f32) -> u32 {
        let id = self.xys.len() as u32;
        self.xys.push(xy);
        self.cov2ds.push([cov[0], cov[1], cov[2], 0.0]);
        self.colors.push([color[0], color[1], color[2], 0.0]);
        self.opacity.push(opacity);
        id
    }

    pub fn len(&self) -> usize {
        self.xys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xys.is_empty()
    }

    /// True when every attribute array has the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.xys.len();
        self.cov2ds.len() == n && self.colors.len() == n && self.opacity.len() == n
    }
}

/// Inverse of a 2D covariance, used to evaluate the Gaussian density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conic {
    pub xx: f32,
    pub xy: f32,
    pub yy: f32,
}

impl Conic {
    pub const ZERO: Self = Self {
        xx: 0.0,
        xy: 0.0,
        yy: 0.0,
    };
}

pub fn invert_2x2_covariance(cov: [f32; 3]) -> Option<Conic> {
    let det = det_2x2(cov);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some(Conic {
        xx: cov[2] * inv_det,
        xy: -cov[1] * inv_det,
        yy: cov[0] * inv_det,
    })
}

/// Singular covariances map to a zero conic; their compensation is zero too,
/// so they never pass the alpha threshold.
pub fn cov_to_conic(cov: [f32; 3]) -> Conic {
    invert_2x2_covariance(cov).unwrap_or(Conic::ZERO)
}

/// Opacity correction for the [`COV_BLUR`] added upstream, in `[0, 1]`.
///
/// Blurring widens the footprint of small splats; scaling opacity by the ratio
/// of the determinant roots keeps their integrated energy unchanged.
pub fn cov_compensation(cov: [f32; 3]) -> f32 {
    let det = det_2x2(cov);
    if det <= 0.0 {
        return 0.0;
    }
    let det_orig = det_2x2([cov[0] - COV_BLUR, cov[1], cov[2] - COV_BLUR]);
    (det_orig / det).max(0.0).sqrt()
}

/// `0.5 * (a dx^2 + c dy^2) + b dx dy` for conic `(a, b, c)`.
pub fn gaussian_exponent(conic: Conic, delta: [f32; 2]) -> f32 {
    0.5 * (conic.xx * delta[0] * delta[0] + conic.yy * delta[1] * delta[1])
        + conic.xy * delta[0] * delta[1]
}

pub fn splat_alpha(opacity: f32, compensation: f32, sigma: f32) -> f32 {
    (opacity * compensation * (-sigma).exp()).min(ALPHA_MAX)
}

/// Screen-space radius covering [`GAUSSIAN_SIGMA_CUTOFF`] standard deviations.
pub fn gaussian_extent(cov: [f32; 3]) -> f32 {
    GAUSSIAN_SIGMA_CUTOFF * max_eigenvalue(cov).max(0.0).sqrt()
}
