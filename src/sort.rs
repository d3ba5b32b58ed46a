//! Reference binning stage: assigns projected splats to the tiles they touch
//! and sorts each tile's list front to back.

use rayon::prelude::*;

use crate::raster::{TileBin, TileGrid, TILE_SIZE};
use crate::splat::{gaussian_extent, ProjectedSplats};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileBinning {
    pub grid: TileGrid,
    pub sorted_ids: Vec<u32>,
    pub tile_bins: Vec<TileBin>,
}

#[derive(Debug, Clone, Copy)]
struct Intersection {
    tile_id: u32,
    depth: f32,
    splat_id: u32,
}

/// Half-open tile rectangle `[min, max)` overlapped by a disc, clamped to the grid.
fn tile_rect(xy: [f32; 2], radius: f32, grid: &TileGrid) -> ([u32; 2], [u32; 2]) {
    let tile = TILE_SIZE as f32;
    let clamp_x = |v: f32| v.clamp(0.0, grid.tiles_x as f32) as u32;
    let clamp_y = |v: f32| v.clamp(0.0, grid.tiles_y as f32) as u32;
    (
        [
            clamp_x(((xy[0] - radius) / tile).floor()),
            clamp_y(((xy[1] - radius) / tile).floor()),
        ],
        [
            clamp_x(((xy[0] + radius) / tile).ceil()),
            clamp_y(((xy[1] + radius) / tile).ceil()),
        ],
    )
}

fn sort_by_depth(intersections: &mut [Intersection]) {
    intersections.par_sort_unstable_by(|a, b| {
        a.tile_id
            .cmp(&b.tile_id)
            .then(
                a.depth
                    .partial_cmp(&b.depth)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.splat_id.cmp(&b.splat_id))
    });
}

/// Bins `splats` (with one view depth per splat) for an image of `img_size`.
///
/// Splats with non-positive opacity, non-finite centers or an empty footprint
/// are culled. Tiles nothing touches get the empty range `[0, 0)`.
pub fn bin_splats(splats: &ProjectedSplats, depths: &[f32], img_size: [u32; 2]) -> TileBinning {
    debug_assert_eq!(splats.len(), depths.len());
    let grid = TileGrid::for_image(img_size);

    let mut intersections: Vec<Intersection> = splats
        .xys
        .par_iter()
        .zip(splats.cov2ds.par_iter())
        .zip(splats.opacity.par_iter())
        .zip(depths.par_iter())
        .enumerate()
        .flat_map_iter(|(id, (((xy, cov), &opacity), &depth))| {
            let radius = gaussian_extent([cov[0], cov[1], cov[2]]);
            let visible = opacity > 0.0
                && radius > 0.0
                && xy[0].is_finite()
                && xy[1].is_finite()
                && depth.is_finite();
            let (min, max) = if visible {
                tile_rect(*xy, radius, &grid)
            } else {
                ([0, 0], [0, 0])
            };
            (min[1]..max[1]).flat_map(move |ty| {
                (min[0]..max[0]).map(move |tx| Intersection {
                    tile_id: ty * grid.tiles_x + tx,
                    depth,
                    splat_id: id as u32,
                })
            })
        })
        .collect();

    sort_by_depth(&mut intersections);

    let mut tile_bins = vec![TileBin::default(); grid.num_tiles()];
    for (i, isect) in intersections.iter().enumerate() {
        let bin = &mut tile_bins[isect.tile_id as usize];
        let i = i as u32;
        if bin.start == bin.end {
            bin.start = i;
        }
        bin.end = i + 1;
    }

    TileBinning {
        grid,
        sorted_ids: intersections.iter().map(|isect| isect.splat_id).collect(),
        tile_bins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_splat_scene() -> (ProjectedSplats, Vec<f32>) {
        let mut splats = ProjectedSplats::with_capacity(3);
        // Far splat covering tiles 0, 1, 3 and 4.
        splats.push([16.0, 8.0], [9.0, 0.0, 9.0], [1.0, 0.0, 0.0], 0.8);
        // Near splat inside tile 0.
        splats.push([6.0, 6.0], [1.0, 0.0, 1.0], [0.0, 1.0, 0.0], 0.8);
        // Culled: zero opacity.
        splats.push([6.0, 6.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0], 0.0);
        (splats, vec![5.0, 1.0, 0.5])
    }

    #[test]
    fn bins_are_sorted_front_to_back() {
        let (splats, depths) = two_splat_scene();
        let binning = bin_splats(&splats, &depths, [48, 32]);

        assert_eq!(binning.grid, TileGrid { tiles_x: 3, tiles_y: 2 });
        assert_eq!(binning.tile_bins.len(), 6);

        let tile0 = binning.tile_bins[0];
        let ids = &binning.sorted_ids[tile0.start as usize..tile0.end as usize];
        assert_eq!(ids, &[1, 0]);

        let tile1 = binning.tile_bins[1];
        assert_eq!(
            &binning.sorted_ids[tile1.start as usize..tile1.end as usize],
            &[0]
        );
        assert!(!binning.sorted_ids.contains(&2));
    }

    #[test]
    fn bins_partition_the_sorted_list() {
        let (splats, depths) = two_splat_scene();
        let binning = bin_splats(&splats, &depths, [48, 32]);

        let mut covered = 0;
        let mut last_end = 0;
        for bin in binning.tile_bins.iter().filter(|bin| bin.start != bin.end) {
            assert!(bin.start <= bin.end);
            assert!(bin.start >= last_end);
            last_end = bin.end;
            covered += bin.end - bin.start;
        }
        assert_eq!(covered as usize, binning.sorted_ids.len());
    }

    #[test]
    fn empty_scene_has_empty_bins() {
        let binning = bin_splats(&ProjectedSplats::default(), &[], [20, 20]);
        assert!(binning.sorted_ids.is_empty());
        assert_eq!(binning.tile_bins, vec![TileBin::default(); 4]);
    }
}
