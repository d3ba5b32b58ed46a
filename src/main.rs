use clap::Parser;
use log::info;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tilesplat::demo::generate_demo_splats;
use tilesplat::math::rgb_to_u8;
use tilesplat::preview::{detect_truecolor, print_halfblock};
use tilesplat::raster::tile_depth;
use tilesplat::sort::bin_splats;
use tilesplat::{rasterize, RasterConfig, RasterInputs, RasterOutput, Uniforms};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(
    name = "tilesplat",
    version,
    about = "Tile-based forward rasterizer for projected Gaussian splats"
)]
struct Cli {
    #[arg(long, default_value_t = 320, help = "Image width in pixels")]
    width: u32,
    #[arg(long, default_value_t = 240, help = "Image height in pixels")]
    height: u32,
    #[arg(long, value_name = "N", default_value_t = 20_000, help = "Number of demo splats")]
    count: usize,
    #[arg(long, default_value_t = 42, help = "Seed for the demo scene")]
    seed: u64,
    #[arg(
        long,
        value_name = "R,G,B",
        value_delimiter = ',',
        default_values_t = [0.0, 0.0, 0.0],
        help = "Background color, linear [0, 1]"
    )]
    background: Vec<f32>,
    #[arg(long, help = "Disable the group-wide saturation early exit")]
    no_early_exit: bool,
    #[arg(long, help = "Composite the lanes of each batch in parallel")]
    parallel_lanes: bool,
    #[arg(long, value_name = "PNG", help = "Write the composited image to a PNG file")]
    output: Option<PathBuf>,
    #[arg(long, help = "Print a half-block preview to the terminal")]
    preview: bool,
    #[arg(long, help = "Print the per-tile splat count summary")]
    tile_depth: bool,
}

fn write_png(output: &RasterOutput, path: &Path) -> AppResult<()> {
    let bytes: Vec<u8> = output
        .image
        .iter()
        .flat_map(|p| rgb_to_u8([p[0], p[1], p[2]]))
        .collect();
    let img = image::RgbImage::from_raw(output.width, output.height, bytes)
        .ok_or("image buffer does not match its dimensions")?;
    img.save(path)?;
    Ok(())
}

fn print_tile_depth(depths: &[u32], tiles_x: u32) {
    let max = depths.iter().copied().max().unwrap_or(0);
    let total: u64 = depths.iter().map(|&d| u64::from(d)).sum();
    let mean = total as f64 / depths.len().max(1) as f64;
    println!("tile depth: max {max}, mean {mean:.1}");
    for row in depths.chunks(tiles_x.max(1) as usize) {
        let line: Vec<String> = row.iter().map(|d| format!("{d:4}")).collect();
        println!("{}", line.join(""));
    }
}

fn main() -> AppResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    let img_size = [cli.width, cli.height];
    let background = match cli.background.as_slice() {
        &[r, g, b] => [r, g, b],
        _ => return Err("--background takes exactly three components".into()),
    };

    let scene = generate_demo_splats(cli.count, cli.seed, img_size);
    let binning = bin_splats(&scene.splats, &scene.depths, img_size);
    info!(
        "binned {} splats into {} intersections over {}x{} tiles",
        scene.splats.len(),
        binning.sorted_ids.len(),
        binning.grid.tiles_x,
        binning.grid.tiles_y
    );

    let inputs = RasterInputs {
        sorted_ids: &binning.sorted_ids,
        tile_bins: &binning.tile_bins,
        splats: &scene.splats,
    };
    let uniforms = Uniforms::new(img_size, background);
    let config = RasterConfig {
        group_early_exit: !cli.no_early_exit,
        parallel_lanes: cli.parallel_lanes,
    };

    let start = Instant::now();
    let output = rasterize(&inputs, &uniforms, &config)?;
    let elapsed = start.elapsed();

    let stats = &output.stats;
    println!(
        "{}x{}: {} tiles, {} intersections, {} batches, {} early exits, {} blended, {} saturated px in {:.2} ms",
        output.width,
        output.height,
        stats.tiles,
        stats.intersections,
        stats.batches,
        stats.early_exits,
        stats.contributions,
        stats.saturated_pixels,
        elapsed.as_secs_f64() * 1000.0
    );

    if cli.tile_depth {
        print_tile_depth(&tile_depth(&binning.tile_bins), binning.grid.tiles_x);
    }

    if let Some(path) = cli.output.as_deref() {
        write_png(&output, path)?;
        info!("wrote {}", path.display());
    }

    if cli.preview {
        let (cols, _) = crossterm::terminal::size().unwrap_or((80, 24));
        let mut stdout = BufWriter::new(io::stdout());
        print_halfblock(&output, cols.max(1) as usize, detect_truecolor(), &mut stdout)?;
    }

    Ok(())
}
