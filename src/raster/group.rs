use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use super::batch::{GroupBarrier, SharedBatch};
use super::compositor::PixelAccumulator;
use super::tile::{TileGrid, TileRange};
use super::types::{Uniforms, BATCH_SIZE, TILE_SIZE};
use super::writer::BandWriter;
use super::{RasterConfig, RasterInputs};

/// What one tile's group did, for [`super::RasterStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupReport {
    pub batches: u64,
    pub barriers: u64,
    pub early_exit: bool,
    pub contributions: u64,
    pub saturated_pixels: u64,
}

/// One thread-group: a shared batch arena, one lane per tile pixel, a group
/// barrier and the group-shared count of lanes that are done.
///
/// A group is reset and reused for every tile a worker processes.
#[derive(Debug)]
pub struct ThreadGroup {
    batch: SharedBatch,
    lanes: Vec<PixelAccumulator>,
    barrier: GroupBarrier,
    done_lanes: AtomicU32,
}

impl Default for ThreadGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadGroup {
    pub fn new() -> Self {
        Self {
            batch: SharedBatch::new(),
            lanes: vec![PixelAccumulator::default(); BATCH_SIZE],
            barrier: GroupBarrier::default(),
            done_lanes: AtomicU32::new(0),
        }
    }

    fn reset(&mut self, group: [u32; 2], img_size: [u32; 2], range: TileRange) {
        let origin = TileGrid::tile_origin(group);
        let mut done = 0;
        for (local, lane) in self.lanes.iter_mut().enumerate() {
            let local = local as u32;
            let pixel = [origin[0] + local % TILE_SIZE, origin[1] + local / TILE_SIZE];
            *lane = PixelAccumulator::new(pixel, img_size, range.end);
            if lane.done {
                done += 1;
            }
        }
        self.done_lanes.store(done, Ordering::Relaxed);
        self.barrier.reset();
    }

    /// Runs the tile at `group` over `range` and writes its in-bounds pixels.
    pub fn run(
        &mut self,
        group: [u32; 2],
        range: TileRange,
        inputs: &RasterInputs<'_>,
        uniforms: &Uniforms,
        config: &RasterConfig,
        writer: &mut BandWriter<'_>,
    ) -> GroupReport {
        self.reset(group, uniforms.img_size, range);

        let Self {
            batch,
            lanes,
            barrier,
            done_lanes,
        } = self;
        let done_lanes: &AtomicU32 = done_lanes;

        let mut report = GroupReport::default();
        for b in 0..range.num_batches() {
            let mut loader = batch.begin_load(barrier);

            // Read after the loop-top barrier, so every lane sees the same count.
            if config.group_early_exit && done_lanes.load(Ordering::Relaxed) as usize == BATCH_SIZE
            {
                report.early_exit = true;
                break;
            }

            let batch_start = range.batch_start(b);
            loader.load_cooperative(batch_start, range.end, inputs.sorted_ids, inputs.splats);
            let view = loader.publish(barrier, batch_start, range.remaining(b));
            report.batches += 1;

            let step = |lane: &mut PixelAccumulator| {
                if lane.composite(&view) {
                    done_lanes.fetch_add(1, Ordering::Relaxed);
                }
            };
            if config.parallel_lanes {
                lanes.par_iter_mut().for_each(step);
            } else {
                lanes.iter_mut().for_each(step);
            }
        }
        report.barriers = barrier.crossings();

        for lane in lanes.iter() {
            if writer.write(lane, uniforms.background) {
                report.contributions += u64::from(lane.contributions);
                if lane.done {
                    report.saturated_pixels += 1;
                }
            }
        }
        report
    }
}
