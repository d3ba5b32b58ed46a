//! Forward rasterization core of a tile-based Gaussian splatting renderer.
//!
//! [`raster::rasterize`] composites depth-sorted, tile-binned 2D splats front
//! to back, one emulated thread-group per 16x16 tile, and records for every
//! pixel the last splat that contributed to it.

pub mod demo;
pub mod math;
pub mod preview;
pub mod raster;
pub mod sort;
pub mod splat;

pub use raster::{
    rasterize, RasterConfig, RasterError, RasterInputs, RasterOutput, RasterStats, TileBin,
    Uniforms, BATCH_SIZE, TILE_SIZE,
};
pub use splat::ProjectedSplats;
