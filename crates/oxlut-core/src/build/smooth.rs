//! Anti-banding passes run over a fully sampled grid
//!
//! Both passes read neighbouring vertices, so they only start once every
//! vertex of the grid walk has been stored.

use super::clip::clamp_unit;
use crate::MAX_CHANNELS;
use crate::error::{Result, try_zeroed};
use crate::lut::LutGeometry;

/// Fraction of the center discrepancy blended into a vertex
pub const LEAST_SQUARES_WEIGHT: f64 = 0.5;

/// Largest channel discrepancy that is still corrected
pub const LEAST_SQUARES_THRESHOLD: f64 = 0.2;

/// Number of smoothing passes
const FILTER_PASSES: usize = 2;

/// Index arithmetic over a staging grid
#[derive(Debug, Clone)]
pub(crate) struct GridShape {
    pub dims: usize,
    pub resolution: usize,
    pub outputs: usize,
    pub strides: Vec<usize>,
    pub cube: Vec<usize>,
}

impl GridShape {
    pub fn new(geometry: &LutGeometry) -> Self {
        let strides = geometry.strides();
        let cube = geometry.cube_offsets(&strides);
        Self {
            dims: geometry.input_channels,
            resolution: geometry.resolution,
            outputs: geometry.output_channels,
            strides,
            cube,
        }
    }

    #[inline]
    pub fn offset(&self, index: &[usize]) -> usize {
        index.iter().zip(&self.strides).map(|(i, s)| i * s).sum()
    }
}

/// Step `index` through the box `lo..=hi`, last axis fastest.
///
/// Returns false once the box is exhausted.
pub(crate) fn next_index(index: &mut [usize], lo: &[usize], hi: &[usize]) -> bool {
    for e in (0..index.len()).rev() {
        if index[e] < hi[e] {
            index[e] += 1;
            return true;
        }
        index[e] = lo[e];
    }
    false
}

/// Pull interior vertices toward the cell centers around them.
///
/// `centers` holds the cell center sample of each cell at the offset of the
/// cell's lower corner. Cells `gmin..gmax` on every axis must be sampled.
pub(crate) fn least_squares(
    shape: &GridShape,
    clut: &mut [f64],
    centers: &[f64],
    (gmin, gmax): (usize, usize),
    unchecked_channels: usize,
) -> bool {
    if gmax < gmin + 2 {
        return false;
    }
    let outputs = shape.outputs;
    let far = shape.cube.last().copied().unwrap_or(0);
    let corners = shape.cube.len() as f64;
    let lo = vec![gmin; shape.dims];
    let hi = vec![gmax - 2; shape.dims];
    let mut index = lo.clone();
    let mut mval = [0.0; MAX_CHANNELS];
    let mut clipped = false;
    let mut adjusted = 0usize;

    loop {
        let base = shape.offset(&index);
        let vertex = base + far;
        let mut maxd: f64 = 0.0;
        for (f, m) in mval[..outputs].iter_mut().enumerate() {
            let mean = shape
                .cube
                .iter()
                .map(|c| centers[base + c + f])
                .sum::<f64>()
                / corners;
            *m = clut[vertex + f] - mean;
            maxd = maxd.max(m.abs());
        }

        if outputs <= unchecked_channels || maxd < LEAST_SQUARES_THRESHOLD {
            let values = &mut clut[vertex..vertex + outputs];
            for (v, m) in values.iter_mut().zip(&mval) {
                *v += LEAST_SQUARES_WEIGHT * m;
            }
            clipped |= clamp_unit(values);
            adjusted += 1;
        }

        if !next_index(&mut index, &lo, &hi) {
            break;
        }
    }

    tracing::trace!(adjusted, clipped, "least squares pass");
    clipped
}

/// Replace vertices that asked for smoothing with a triangular weighted
/// mean of the vertices within their radius.
///
/// `radii` holds one radius per vertex in normalized input units.
/// `overshoot` holds what the grid clamp removed from each sample, so the
/// passes average the unclamped field. Only the final smoothed values are
/// clamped.
pub(crate) fn filter(
    shape: &GridShape,
    clut: &mut [f64],
    overshoot: &[f64],
    radii: &[f64],
) -> Result<bool> {
    let last = (shape.resolution - 1) as f64;
    if !radii.iter().any(|r| r * last > 0.5) {
        return Ok(false);
    }

    let outputs = shape.outputs;
    let zero = vec![0; shape.dims];
    let top = vec![shape.resolution - 1; shape.dims];
    let mut field = try_zeroed(clut.len(), "smoothing field")?;
    for ((f, c), o) in field.iter_mut().zip(clut.iter()).zip(overshoot) {
        *f = c + o;
    }
    let mut source = try_zeroed(clut.len(), "smoothing copy")?;
    let mut lo = vec![0; shape.dims];
    let mut hi = vec![0; shape.dims];
    let mut near = vec![0; shape.dims];
    let mut acc = [0.0; MAX_CHANNELS];

    for pass in 0..FILTER_PASSES {
        source.copy_from_slice(&field);
        let mut index = zero.clone();
        let mut smoothed = 0usize;
        loop {
            let offset = shape.offset(&index);
            let rg = radii[offset / outputs] * last;
            if rg > 0.5 {
                let reach = rg.floor() as usize;
                for e in 0..shape.dims {
                    lo[e] = index[e].saturating_sub(reach);
                    hi[e] = (index[e] + reach).min(shape.resolution - 1);
                }
                near.copy_from_slice(&lo);

                let acc = &mut acc[..outputs];
                acc.fill(0.0);
                let mut total = 0.0;
                loop {
                    let d = near
                        .iter()
                        .zip(&index)
                        .map(|(&a, &b)| {
                            let t = a.abs_diff(b) as f64;
                            t * t
                        })
                        .sum::<f64>()
                        .sqrt();
                    if d < rg {
                        let w = 1.0 - d / rg;
                        let o = shape.offset(&near);
                        for (a, v) in acc.iter_mut().zip(&source[o..o + outputs]) {
                            *a += w * v;
                        }
                        total += w;
                    }
                    if !next_index(&mut near, &lo, &hi) {
                        break;
                    }
                }

                // The vertex itself always contributes with weight 1
                for (v, a) in field[offset..offset + outputs].iter_mut().zip(acc.iter()) {
                    *v = a / total;
                }
                smoothed += 1;
            }
            if !next_index(&mut index, &zero, &top) {
                break;
            }
        }
        tracing::trace!(pass, smoothed, "smoothing pass");
    }

    let mut clipped = false;
    for (vertex, r) in radii.iter().enumerate() {
        if r * last > 0.5 {
            let slot = vertex * outputs..(vertex + 1) * outputs;
            let values = &mut clut[slot.clone()];
            values.copy_from_slice(&field[slot]);
            clipped |= clamp_unit(values);
        }
    }
    Ok(clipped)
}
