use thiserror::Error;

/// Host-side contract violations detected before dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error(
        "splat attribute arrays disagree in length (xys={xys}, cov2ds={cov2ds}, colors={colors}, opacity={opacity})"
    )]
    SplatArrayMismatch {
        xys: usize,
        cov2ds: usize,
        colors: usize,
        opacity: usize,
    },
    #[error("tile table has {actual} entries, dispatch grid needs {expected}")]
    TileTableMismatch { expected: usize, actual: usize },
    #[error("sorted position {position} refers to splat {id}, but only {count} splats exist")]
    SplatIdOutOfRange { position: usize, id: u32, count: usize },
    #[error("sorted list of {0} entries does not fit 32-bit batch positions")]
    SortedListTooLong(usize),
    #[error("image of {width}x{height} pixels is too large")]
    ImageTooLarge { width: u32, height: u32 },
}
