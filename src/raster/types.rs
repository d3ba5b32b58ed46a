use bytemuck::{Pod, Zeroable};

/// Side of a square screen tile; one thread-group covers one tile.
pub const TILE_SIZE: u32 = 16;
/// Lanes per thread-group, and slots in the shared batch.
pub const BATCH_SIZE: usize = (TILE_SIZE * TILE_SIZE) as usize;

/// `[start, end)` offsets into the sorted splat id list for one tile.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TileBin {
    pub start: u32,
    pub end: u32,
}

impl TileBin {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// Per-invocation constants, laid out like the WGSL uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub img_size: [u32; 2],
    pub _pad0: [u32; 2],
    pub background: [f32; 3],
    pub _pad1: u32,
}

impl Uniforms {
    pub fn new(img_size: [u32; 2], background: [f32; 3]) -> Self {
        Self {
            img_size,
            _pad0: [0; 2],
            background,
            _pad1: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.img_size[0]
    }

    pub fn height(&self) -> u32 {
        self.img_size[1]
    }
}

// Hard fail at compile time if the host <-> shader layout drifts.
const _: [(); 8] = [(); std::mem::size_of::<TileBin>()];
const _: [(); 32] = [(); std::mem::size_of::<Uniforms>()];
