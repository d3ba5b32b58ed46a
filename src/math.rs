// --- Scalar helpers ---

pub fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Maps a linear `[0, 1]` channel to a byte, saturating out-of-range values.
pub fn unit_to_u8(v: f32) -> u8 {
    clamp_u8(v * 255.0)
}

pub fn rgb_to_u8(rgb: [f32; 3]) -> [u8; 3] {
    [unit_to_u8(rgb[0]), unit_to_u8(rgb[1]), unit_to_u8(rgb[2])]
}

/// `h` in degrees, `s`/`v` in `[0, 1]`. Returns linear RGB in `[0, 1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h = h.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}

// --- 2x2 symmetric matrices, packed as (xx, xy, yy) ---

pub fn det_2x2(m: [f32; 3]) -> f32 {
    m[0] * m[2] - m[1] * m[1]
}

/// Builds `R * diag(sx^2, sy^2) * R^T` for a rotation of `angle` radians.
pub fn rotated_covariance(sx: f32, sy: f32, angle: f32) -> [f32; 3] {
    let (s, c) = angle.sin_cos();
    let vx = sx * sx;
    let vy = sy * sy;
    [
        c * c * vx + s * s * vy,
        c * s * (vx - vy),
        s * s * vx + c * c * vy,
    ]
}

/// Largest eigenvalue of a symmetric 2x2 matrix.
pub fn max_eigenvalue(m: [f32; 3]) -> f32 {
    let mid = 0.5 * (m[0] + m[2]);
    let disc = (mid * mid - det_2x2(m)).max(0.1).sqrt();
    mid + disc
}
