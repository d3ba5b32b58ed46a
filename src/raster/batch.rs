use crate::splat::ProjectedSplats;

use super::types::BATCH_SIZE;

/// One splat's attributes, as staged in group-shared memory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchSlot {
    pub xy: [f32; 2],
    pub cov: [f32; 3],
    pub color: [f32; 3],
    pub opacity: f32,
}

impl BatchSlot {
    pub fn gather(splats: &ProjectedSplats, id: u32) -> Self {
        let id = id as usize;
        let cov = splats.cov2ds[id];
        let color = splats.colors[id];
        Self {
            xy: splats.xys[id],
            cov: [cov[0], cov[1], cov[2]],
            color: [color[0], color[1], color[2]],
            opacity: splats.opacity[id],
        }
    }
}

/// Counts full-group synchronisation points.
///
/// Lanes run in lockstep, so reaching a wait means every lane has arrived.
#[derive(Debug, Default)]
pub struct GroupBarrier {
    crossings: u64,
}

impl GroupBarrier {
    pub fn wait(&mut self) {
        self.crossings += 1;
    }

    pub fn crossings(&self) -> u64 {
        self.crossings
    }

    pub fn reset(&mut self) {
        self.crossings = 0;
    }
}

/// Fixed arena of [`BATCH_SIZE`] slots reused for every batch of every tile.
///
/// Writing requires a [`BatchLoader`], which holds the arena exclusively;
/// reading requires a [`BatchView`], which only exists after the post-load
/// barrier. A new load cannot start while any view is alive.
#[derive(Debug)]
pub struct SharedBatch {
    slots: Box<[BatchSlot]>,
}

impl Default for SharedBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBatch {
    pub fn new() -> Self {
        Self {
            slots: vec![BatchSlot::default(); BATCH_SIZE].into_boxed_slice(),
        }
    }

    /// Crosses the loop-top barrier and opens the arena for writing.
    pub fn begin_load<'a>(&'a mut self, barrier: &mut GroupBarrier) -> BatchLoader<'a> {
        barrier.wait();
        BatchLoader {
            slots: &mut self.slots,
        }
    }
}

#[derive(Debug)]
pub struct BatchLoader<'a> {
    slots: &'a mut [BatchSlot],
}

impl<'a> BatchLoader<'a> {
    /// Every lane `i` loads sorted position `batch_start + i` when it lies
    /// before `end`; lanes past the end leave their slot stale.
    ///
    /// Lanes take part regardless of their own pixel's state.
    pub fn load_cooperative(
        &mut self,
        batch_start: u32,
        end: u32,
        sorted_ids: &[u32],
        splats: &ProjectedSplats,
    ) -> usize {
        let mut loaded = 0;
        for (lane, slot) in self.slots.iter_mut().enumerate() {
            let position = batch_start + lane as u32;
            if position < end {
                *slot = BatchSlot::gather(splats, sorted_ids[position as usize]);
                loaded += 1;
            }
        }
        loaded
    }

    /// Crosses the post-load barrier and exposes the first `remaining` slots.
    pub fn publish(
        self,
        barrier: &mut GroupBarrier,
        batch_start: u32,
        remaining: usize,
    ) -> BatchView<'a> {
        barrier.wait();
        let slots: &'a [BatchSlot] = self.slots;
        BatchView {
            slots: &slots[..remaining],
            base: batch_start,
        }
    }
}

/// Read-only view of the loaded part of a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a> {
    slots: &'a [BatchSlot],
    base: u32,
}

impl<'a> BatchView<'a> {
    pub(crate) fn new(slots: &'a [BatchSlot], base: u32) -> Self {
        Self { slots, base }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sorted-list position of the first slot.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Slots front to back, paired with their sorted-list positions.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &'a BatchSlot)> + 'a {
        let base = self.base;
        self.slots
            .iter()
            .enumerate()
            .map(move |(t, slot)| (base + t as u32, slot))
    }
}
