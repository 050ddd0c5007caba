//! Lookup table geometry and derived index tables

use crate::MAX_CHANNELS;
use crate::error::{LutError, Result};
use crate::math::grid_points;

/// Default input/output curve length, the `lut8` value
pub const DEFAULT_TABLE_ENTRIES: usize = 256;

/// Shape of a lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LutGeometry {
    /// Number of input channels
    pub input_channels: usize,
    /// Number of output channels
    pub output_channels: usize,
    /// Grid points per input axis
    pub resolution: usize,
    /// Samples per input curve
    pub input_entries: usize,
    /// Samples per output curve
    pub output_entries: usize,
}

impl LutGeometry {
    pub fn new(input_channels: usize, output_channels: usize, resolution: usize) -> Self {
        Self {
            input_channels,
            output_channels,
            resolution,
            input_entries: DEFAULT_TABLE_ENTRIES,
            output_entries: DEFAULT_TABLE_ENTRIES,
        }
    }

    pub fn with_input_entries(mut self, entries: usize) -> Self {
        self.input_entries = entries;
        self
    }

    pub fn with_output_entries(mut self, entries: usize) -> Self {
        self.output_entries = entries;
        self
    }

    /// Check channel counts, resolution, curve lengths and grid size
    pub fn validate(&self) -> Result<()> {
        for channels in [self.input_channels, self.output_channels] {
            if channels == 0 || channels > MAX_CHANNELS {
                return Err(LutError::UnsupportedChannelCount(channels));
            }
        }
        if self.resolution < 2 {
            return Err(LutError::InvalidResolution(self.resolution));
        }
        for entries in [self.input_entries, self.output_entries] {
            if entries < 2 {
                return Err(LutError::InvalidTableEntries(entries));
            }
        }
        self.clut_len().map(|_| ())
    }

    /// Number of grid vertices, `resolution ^ input_channels`
    pub fn vertex_count(&self) -> Result<usize> {
        grid_points(self.resolution, self.input_channels).ok_or(self.too_large())
    }

    /// Number of CLUT samples, `output_channels * resolution ^ input_channels`
    pub fn clut_len(&self) -> Result<usize> {
        self.vertex_count()?
            .checked_mul(self.output_channels)
            .ok_or(self.too_large())
    }

    /// Per-axis element strides. The last axis varies fastest.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![0; self.input_channels];
        let mut stride = self.output_channels;
        for s in strides.iter_mut().rev() {
            *s = stride;
            stride = stride.saturating_mul(self.resolution);
        }
        strides
    }

    /// Element offsets of the `2^input_channels` corners of a grid cell.
    ///
    /// Bit `e` of the corner number selects the upper grid line of axis `e`.
    pub fn cube_offsets(&self, strides: &[usize]) -> Vec<usize> {
        let mut cube = vec![0; 1 << self.input_channels];
        let mut g = 1;
        for &stride in strides {
            for i in 0..g {
                cube[g + i] = cube[i] + stride;
            }
            g *= 2;
        }
        cube
    }

    fn too_large(&self) -> LutError {
        LutError::GridTooLarge {
            resolution: self.resolution,
            channels: self.input_channels,
            outputs: self.output_channels,
        }
    }
}
