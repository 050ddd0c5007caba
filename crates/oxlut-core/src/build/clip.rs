//! Clip classification for table population

/// Tolerance beyond `[0, 1]` before a value counts as clipped
pub const CLIP_MARGIN: f64 = 0.005;

/// Population stage at which a value was clamped.
///
/// Ordered from earliest to latest. Population reports the latest stage
/// that clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClipStage {
    /// Nothing clipped
    #[default]
    None,
    /// Input curve samples
    InputTable,
    /// Grid vertex samples
    Grid,
    /// Cell center samples and the least squares blend
    GridMidpoint,
    /// Vertex smoothing
    MidpointInterp,
    /// Output curve samples
    OutputTable,
}

impl ClipStage {
    /// Raise `self` to `stage` when `clipped`
    #[inline]
    pub fn record(&mut self, stage: ClipStage, clipped: bool) {
        if clipped && stage > *self {
            *self = stage;
        }
    }
}

/// Clamp `values` to `[0, 1]`. Returns true if any was outside the margin.
///
/// Non-finite values count as clipped and become 0.
pub(crate) fn clamp_unit(values: &mut [f64]) -> bool {
    let mut clipped = false;
    for v in values {
        if !v.is_finite() {
            *v = 0.0;
            clipped = true;
            continue;
        }
        if *v < -CLIP_MARGIN || *v > 1.0 + CLIP_MARGIN {
            clipped = true;
        }
        *v = v.clamp(0.0, 1.0);
    }
    clipped
}
