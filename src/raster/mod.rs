//! Tile-based forward compositing of depth-sorted, tile-binned splats.
//!
//! One [`ThreadGroup`] per screen tile walks that tile's range of the sorted
//! splat list in batches of [`BATCH_SIZE`], staging each batch in a shared
//! arena and blending it front to back into one accumulator per pixel.

mod batch;
mod compositor;
mod error;
mod group;
mod tile;
mod types;
mod writer;

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::splat::ProjectedSplats;

pub use batch::{BatchLoader, BatchSlot, BatchView, GroupBarrier, SharedBatch};
pub use compositor::{Candidate, PixelAccumulator};
pub use error::RasterError;
pub use group::{GroupReport, ThreadGroup};
pub use tile::{resolve_tile, sanitize_bin, tile_depth, ResolvedTile, TileGrid, TileRange};
pub use types::{TileBin, Uniforms, BATCH_SIZE, TILE_SIZE};
pub use writer::BandWriter;

/// Read-only inputs produced by the projection and binning stages.
#[derive(Debug, Clone, Copy)]
pub struct RasterInputs<'a> {
    /// Splat ids, sorted by tile and then by depth (nearest first).
    pub sorted_ids: &'a [u32],
    /// One `[start, end)` range into `sorted_ids` per tile, row-major.
    pub tile_bins: &'a [TileBin],
    pub splats: &'a ProjectedSplats,
}

/// Longest sorted list whose batch positions stay within `u32`.
pub const MAX_SORTED_LEN: usize = (u32::MAX - BATCH_SIZE as u32) as usize;
/// Largest image side whose tile-aligned lane coordinates stay within `u32`.
pub const MAX_IMAGE_SIDE: u32 = u32::MAX - TILE_SIZE;

fn check_sorted_len(len: usize) -> Result<(), RasterError> {
    if len > MAX_SORTED_LEN {
        return Err(RasterError::SortedListTooLong(len));
    }
    Ok(())
}

fn check_image_size(width: u32, height: u32) -> Result<usize, RasterError> {
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        return Err(RasterError::ImageTooLarge { width, height });
    }
    usize::try_from(u64::from(width) * u64::from(height))
        .map_err(|_| RasterError::ImageTooLarge { width, height })
}

impl RasterInputs<'_> {
    pub fn validate(&self, grid: &TileGrid) -> Result<(), RasterError> {
        let splats = self.splats;
        if !splats.is_consistent() {
            return Err(RasterError::SplatArrayMismatch {
                xys: splats.xys.len(),
                cov2ds: splats.cov2ds.len(),
                colors: splats.colors.len(),
                opacity: splats.opacity.len(),
            });
        }

        if self.tile_bins.len() != grid.num_tiles() {
            return Err(RasterError::TileTableMismatch {
                expected: grid.num_tiles(),
                actual: self.tile_bins.len(),
            });
        }

        check_sorted_len(self.sorted_ids.len())?;

        let count = splats.len();
        if let Some(position) = self
            .sorted_ids
            .par_iter()
            .position_first(|&id| id as usize >= count)
        {
            return Err(RasterError::SplatIdOutOfRange {
                position,
                id: self.sorted_ids[position],
                count,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterConfig {
    /// Skip a tile's remaining batches once every lane is done.
    pub group_early_exit: bool,
    /// Composite the lanes of a batch on the rayon pool instead of in order.
    pub parallel_lanes: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            group_early_exit: true,
            parallel_lanes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    pub tiles: u64,
    /// Sum of all tile range lengths.
    pub intersections: u64,
    pub batches: u64,
    /// Two per batch, plus one for each early exit.
    pub barriers: u64,
    pub early_exits: u64,
    pub contributions: u64,
    pub saturated_pixels: u64,
    pub clamped_ranges: u64,
}

impl RasterStats {
    fn record(&mut self, tile: &ResolvedTile, report: &GroupReport) {
        self.tiles += 1;
        self.intersections += u64::from(tile.range.len());
        self.batches += report.batches;
        self.barriers += report.barriers;
        self.early_exits += u64::from(report.early_exit);
        self.contributions += report.contributions;
        self.saturated_pixels += report.saturated_pixels;
        self.clamped_ranges += u64::from(tile.clamped);
    }

    fn merge(self, other: Self) -> Self {
        Self {
            tiles: self.tiles + other.tiles,
            intersections: self.intersections + other.intersections,
            batches: self.batches + other.batches,
            barriers: self.barriers + other.barriers,
            early_exits: self.early_exits + other.early_exits,
            contributions: self.contributions + other.contributions,
            saturated_pixels: self.saturated_pixels + other.saturated_pixels,
            clamped_ranges: self.clamped_ranges + other.clamped_ranges,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterOutput {
    pub width: u32,
    pub height: u32,
    /// `(r, g, b, T)` per pixel, row-major.
    pub image: Vec<[f32; 4]>,
    /// Sorted-list position of the last splat blended into each pixel, or the
    /// tile's range end when none was.
    pub final_index: Vec<u32>,
    pub stats: RasterStats,
}

impl RasterOutput {
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.image[y as usize * self.width as usize + x as usize]
    }

    pub fn final_index_at(&self, x: u32, y: u32) -> u32 {
        self.final_index[y as usize * self.width as usize + x as usize]
    }
}

/// Composites every tile of the image.
///
/// Tile rows are distributed over the rayon pool; each worker reuses one
/// [`ThreadGroup`] for all tiles it handles and writes only its own rows.
pub fn rasterize(
    inputs: &RasterInputs<'_>,
    uniforms: &Uniforms,
    config: &RasterConfig,
) -> Result<RasterOutput, RasterError> {
    let (width, height) = (uniforms.width(), uniforms.height());
    let pixel_count = check_image_size(width, height)?;
    let grid = TileGrid::for_image(uniforms.img_size);
    inputs.validate(&grid)?;

    let mut image = vec![[0.0f32; 4]; pixel_count];
    let mut final_index = vec![0u32; pixel_count];

    if pixel_count == 0 {
        return Ok(RasterOutput {
            width,
            height,
            image,
            final_index,
            stats: RasterStats::default(),
        });
    }

    debug!(
        "rasterizing {width}x{height} ({} tiles, {} splats, {} intersections)",
        grid.num_tiles(),
        inputs.splats.len(),
        inputs.sorted_ids.len()
    );

    let sorted_len = inputs.sorted_ids.len() as u32;
    let band_len = TILE_SIZE as usize * width as usize;

    let stats = image
        .par_chunks_mut(band_len)
        .zip(final_index.par_chunks_mut(band_len))
        .enumerate()
        .map_init(ThreadGroup::new, |group, (tile_y, (img_band, idx_band))| {
            let tile_y = tile_y as u32;
            let mut writer = BandWriter::new(img_band, idx_band, width, tile_y * TILE_SIZE);
            let mut stats = RasterStats::default();
            for tile_x in 0..grid.tiles_x {
                let pos = [tile_x, tile_y];
                let tile = resolve_tile(&grid, inputs.tile_bins, pos, sorted_len);
                let report = group.run(pos, tile.range, inputs, uniforms, config, &mut writer);
                stats.record(&tile, &report);
            }
            trace!("tile row {tile_y}: {} batches", stats.batches);
            stats
        })
        .reduce(RasterStats::default, RasterStats::merge);

    if stats.clamped_ranges > 0 {
        warn!(
            "{} malformed tile ranges clamped to the sorted list",
            stats.clamped_ranges
        );
    }
    debug!("raster stats: {stats:?}");

    Ok(RasterOutput {
        width,
        height,
        image,
        final_index,
        stats,
    })
}
