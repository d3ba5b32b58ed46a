use super::types::{TileBin, BATCH_SIZE, TILE_SIZE};

/// Dispatch grid: one thread-group per tile, row-major.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileGrid {
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    pub fn for_image(img_size: [u32; 2]) -> Self {
        Self {
            tiles_x: img_size[0].div_ceil(TILE_SIZE),
            tiles_y: img_size[1].div_ceil(TILE_SIZE),
        }
    }

    pub fn num_tiles(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    pub fn tile_id(&self, group: [u32; 2]) -> usize {
        group[1] as usize * self.tiles_x as usize + group[0] as usize
    }

    /// Top-left pixel of the tile covered by `group`.
    pub fn tile_origin(group: [u32; 2]) -> [u32; 2] {
        [group[0] * TILE_SIZE, group[1] * TILE_SIZE]
    }
}

/// A sanitized `[start, end)` range with `start <= end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileRange {
    pub start: u32,
    pub end: u32,
}

impl TileRange {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn num_batches(&self) -> u32 {
        self.len().div_ceil(BATCH_SIZE as u32)
    }

    pub fn batch_start(&self, batch: u32) -> u32 {
        self.start + batch * BATCH_SIZE as u32
    }

    /// Candidates of `batch` the compositor may read; stale slots lie beyond.
    pub fn remaining(&self, batch: u32) -> usize {
        (self.end - self.batch_start(batch)).min(BATCH_SIZE as u32) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTile {
    pub tile_id: usize,
    pub range: TileRange,
    /// The stored bin was malformed and had to be clamped.
    pub clamped: bool,
}

/// Clamps a stored bin into the sorted list: `end` past the list is pulled
/// back to its length, and `start > end` collapses to the empty range at
/// `start`.
pub fn sanitize_bin(bin: TileBin, sorted_len: u32) -> (TileRange, bool) {
    let start = bin.start.min(sorted_len);
    let end = bin.end.min(sorted_len).max(start);
    let range = TileRange { start, end };
    let clamped = range.start != bin.start || range.end != bin.end;
    (range, clamped)
}

/// Maps a thread-group position to its tile and fetches that tile's range.
pub fn resolve_tile(
    grid: &TileGrid,
    bins: &[TileBin],
    group: [u32; 2],
    sorted_len: u32,
) -> ResolvedTile {
    let tile_id = grid.tile_id(group);
    let (range, clamped) = sanitize_bin(bins[tile_id], sorted_len);
    ResolvedTile {
        tile_id,
        range,
        clamped,
    }
}

/// Number of splats binned into each tile, in tile order.
pub fn tile_depth(bins: &[TileBin]) -> Vec<u32> {
    bins.iter()
        .map(|bin| bin.end.saturating_sub(bin.start))
        .collect()
}
