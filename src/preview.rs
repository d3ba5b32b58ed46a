use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};
use std::io::{self, Write};

use crate::math::rgb_to_u8;
use crate::raster::RasterOutput;

pub const HALF_BLOCK: char = '\u{2584}';

/// `(top, bottom)` colors of one terminal cell.
pub type HalfblockCell = ([u8; 3], [u8; 3]);

pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((r as f32 - 8.0) / 247.0 * 24.0) as u8;
    }
    let ri = (r as f32 / 255.0 * 5.0 + 0.5) as u8;
    let gi = (g as f32 / 255.0 * 5.0 + 0.5) as u8;
    let bi = (b as f32 / 255.0 * 5.0 + 0.5) as u8;
    16 + 36 * ri + 6 * gi + bi
}

pub fn make_color(rgb: [u8; 3], use_truecolor: bool) -> Color {
    if use_truecolor {
        Color::Rgb {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        }
    } else {
        Color::AnsiValue(rgb_to_ansi256(rgb[0], rgb[1], rgb[2]))
    }
}

pub fn detect_truecolor() -> bool {
    match std::env::var("COLORTERM") {
        Ok(val) => val == "truecolor" || val == "24bit",
        Err(_) => false,
    }
}

fn average(sum: [u32; 3], count: u32) -> [u8; 3] {
    if count == 0 {
        return [0, 0, 0];
    }
    [
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ]
}

/// Box-filters an RGB image down to `cols x rows` half-block cells.
pub fn downsample_to_cells(
    rgb: &[[u8; 3]],
    width: usize,
    height: usize,
    cols: usize,
    rows: usize,
) -> Vec<HalfblockCell> {
    let mut out = vec![([0u8; 3], [0u8; 3]); cols * rows];
    if width == 0 || height == 0 {
        return out;
    }

    let sub_rows = rows * 2;
    for (i, cell) in out.iter_mut().enumerate() {
        let (col, row) = (i % cols, i / cols);
        let x0 = col * width / cols;
        let x1 = ((col + 1) * width / cols).max(x0 + 1).min(width);

        let mut halves = [([0u32; 3], 0u32); 2];
        for (half, acc) in halves.iter_mut().enumerate() {
            let sub = row * 2 + half;
            let y0 = sub * height / sub_rows;
            let y1 = ((sub + 1) * height / sub_rows).max(y0 + 1).min(height);
            for y in y0..y1 {
                for p in &rgb[y * width + x0..y * width + x1] {
                    acc.0[0] += p[0] as u32;
                    acc.0[1] += p[1] as u32;
                    acc.0[2] += p[2] as u32;
                    acc.1 += 1;
                }
            }
        }
        *cell = (
            average(halves[0].0, halves[0].1),
            average(halves[1].0, halves[1].1),
        );
    }
    out
}

/// Prints the composited image as colored half blocks, `cols` wide.
pub fn print_halfblock(
    output: &RasterOutput,
    cols: usize,
    use_truecolor: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    let width = output.width as usize;
    let height = output.height as usize;
    if width == 0 || height == 0 || cols == 0 {
        return Ok(());
    }
    let cols = cols.min(width);
    // Terminal cells are roughly twice as tall as wide; each holds two rows.
    let rows = (height * cols).div_ceil(width * 2).max(1);

    let rgb: Vec<[u8; 3]> = output
        .image
        .iter()
        .map(|p| rgb_to_u8([p[0], p[1], p[2]]))
        .collect();
    let cells = downsample_to_cells(&rgb, width, height, cols, rows);

    for row in cells.chunks(cols) {
        let mut last: Option<HalfblockCell> = None;
        for &cell in row {
            if last != Some(cell) {
                queue!(
                    out,
                    SetBackgroundColor(make_color(cell.0, use_truecolor)),
                    SetForegroundColor(make_color(cell.1, use_truecolor))
                )?;
                last = Some(cell);
            }
            queue!(out, Print(HALF_BLOCK))?;
        }
        queue!(out, ResetColor, Print('\n'))?;
    }
    out.flush()
}
