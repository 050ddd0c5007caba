//! Error types for oxlut

use thiserror::Error;

/// Result type for oxlut operations
pub type Result<T> = std::result::Result<T, LutError>;

/// Errors that can occur while shaping, querying or populating lookup tables
///
/// Numeric clipping is never an error; it is reported through return values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LutError {
    /// Channel count outside `1..=MAX_CHANNELS`
    #[error(
        "Unsupported channel count: {0} (supported range is 1..={max})",
        max = crate::MAX_CHANNELS
    )]
    UnsupportedChannelCount(usize),

    /// Grid resolution below 2
    #[error("Invalid grid resolution: {0} (must be at least 2)")]
    InvalidResolution(usize),

    /// Curve table entry count below 2
    #[error("Invalid table entry count: {0} (must be at least 2)")]
    InvalidTableEntries(usize),

    /// `resolution ^ channels * outputs` does not fit in memory addressing
    #[error("Grid too large: {resolution}^{channels} x {outputs} overflows")]
    GridTooLarge {
        resolution: usize,
        channels: usize,
        outputs: usize,
    },

    /// Co-populated tables do not share the same geometry
    #[error("Geometry mismatch between table 0 and table {table}: {reason}")]
    GeometryMismatch { table: usize, reason: String },

    /// Allocation was requested before any geometry was set
    #[error("Lookup table geometry has not been set")]
    GeometryNotSet,

    /// Operation requires storage that has not been allocated
    #[error("Lookup table storage has not been allocated")]
    NotAllocated,

    /// Grid index outside `0..resolution`
    #[error("Grid index {index} on axis {axis} is outside 0..{resolution}")]
    VertexOutOfRange {
        axis: usize,
        index: usize,
        resolution: usize,
    },

    /// Stored grid does not match the declared geometry
    #[error("CLUT holds {actual} samples, geometry needs {expected}")]
    ClutLength { expected: usize, actual: usize },

    /// Backward matrix lookup on a matrix with no inverse
    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// Caller supplied a buffer with the wrong number of channels
    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelCount { expected: usize, actual: usize },

    /// No normalization is known for the color space / encoding pair
    #[error("Unsupported color space mapping: {0}")]
    UnsupportedColorSpace(String),

    /// A value range override is malformed
    #[error("Invalid value range: {0}")]
    InvalidRange(String),

    /// Buffer reservation failed; the named buffer gives its purpose
    #[error("Allocation failed for {0}")]
    Allocation(&'static str),

    /// Sequencer bit budget exceeded
    #[error("Sequencer needs {bits} bits, at most 63 are supported")]
    SequencerTooLarge { bits: u32 },

    /// Population was asked to fill zero tables
    #[error("No tables to populate")]
    NoTables,
}

/// Allocate a filled buffer, reporting failure instead of aborting
pub(crate) fn try_filled<T: Clone>(len: usize, value: T, purpose: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| LutError::Allocation(purpose))?;
    buf.resize(len, value);
    Ok(buf)
}

/// Allocate a zero-filled sample buffer
pub(crate) fn try_zeroed(len: usize, purpose: &'static str) -> Result<Vec<f64>> {
    try_filled(len, 0.0, purpose)
}
