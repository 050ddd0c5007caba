//! Local gradient correction of grid vertices
//!
//! `tune_value` nudges the vertices around one input coordinate so that the
//! interpolated output moves toward a desired value. It is one relaxation
//! step; call it again to converge further.

use super::Lut;
use crate::MAX_CHANNELS;
use crate::error::{LutError, Result};

/// Clipping reported by [`Lut::tune_value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TuneStatus {
    /// The input coordinate was clamped to the grid
    pub input_clipped: bool,
    /// A corrected vertex component was clamped to `[0, 1]`
    pub output_clipped: bool,
}

impl Lut {
    /// Move the grid toward producing `desired` at `input`.
    ///
    /// Uses the weights of the configured interpolation. Each contributing
    /// vertex receives `weight * (desired - current) / Σ weight²`, clamped
    /// to `[0, 1]`.
    pub fn tune_value(&mut self, input: &[f64], desired: &[f64]) -> Result<TuneStatus> {
        let outputs = self.allocated_geometry()?.output_channels;
        if desired.len() != outputs {
            return Err(LutError::ChannelCount {
                expected: outputs,
                actual: desired.len(),
            });
        }

        let stencil = self.stencil(input, self.interpolation())?;
        let mut current = [0.0; MAX_CHANNELS];
        let current = &mut current[..outputs];
        self.blend(&stencil, current)?;

        let norm: f64 = stencil.weights.iter().map(|w| w * w).sum();
        let mut correction = [0.0; MAX_CHANNELS];
        let correction = &mut correction[..outputs];
        for ((c, d), v) in correction.iter_mut().zip(desired).zip(current.iter()) {
            *c = (d - v) / norm;
        }

        let mut status = TuneStatus {
            input_clipped: stencil.clipped,
            output_clipped: false,
        };
        let clut = self.clut_mut();
        for (&offset, &w) in stencil.offsets.iter().zip(&stencil.weights) {
            for (v, c) in clut[offset..offset + outputs].iter_mut().zip(correction.iter()) {
                let tuned = *v + w * c;
                if tuned < 0.0 {
                    *v = 0.0;
                    status.output_clipped = true;
                } else if tuned > 1.0 {
                    *v = 1.0;
                    status.output_clipped = true;
                } else {
                    *v = tuned;
                }
            }
        }

        tracing::trace!(?status, "tuned grid value");
        Ok(status)
    }
}
