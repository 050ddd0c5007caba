//! N-dimensional lookup tables
//!
//! A [`Lut`] is the `lut8`/`lut16` processing chain:
//!
//! - optional 3x3 matrix (XYZ input only)
//! - one input curve per input channel
//! - CLUT grid, multilinear or simplex interpolated
//! - one output curve per output channel
//!
//! The CLUT is a flat buffer with the first input axis varying least
//! rapidly. Strides and cell corner offsets are kept in element units and
//! recomputed whenever the geometry changes.

mod geometry;
mod tune;

pub use geometry::{DEFAULT_TABLE_ENTRIES, LutGeometry};
pub use tune::TuneStatus;

use crate::MAX_CHANNELS;
use crate::curve::Curve1D;
use crate::error::{LutError, Result, try_filled, try_zeroed};
use crate::math::{Matrix3x3, corner_weights, locate, simplex_weights, sort_axes};
use crate::space::ColorSpace;

/// CLUT interpolation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Weighted blend of all `2^D` cell corners
    #[default]
    Multilinear,
    /// Weighted blend of the `D + 1` vertices of the enclosing simplex
    Simplex,
}

/// Projection of the luminance gradient onto the grid diagonal above which
/// simplex interpolation is chosen
const DIAGONAL_THRESHOLD: f64 = 0.8;

impl Interpolation {
    /// Pick the method suited to a table mapping `input` to `output`.
    ///
    /// Device-like input spaces, where luminance follows the grid diagonal,
    /// use simplex. Spaces with a dedicated lightness channel use
    /// multilinear. Otherwise the grid is searched for the direction of the
    /// output luminance change and simplex is used when it runs along the
    /// diagonal.
    pub fn choose(input: ColorSpace, output: ColorSpace, lut: &Lut) -> Result<Self> {
        let geom = lut.allocated_geometry()?;
        check_channels(geom.input_channels, input.channels())?;
        check_channels(geom.output_channels, output.channels())?;

        match input {
            ColorSpace::Xyz
            | ColorSpace::Rgb
            | ColorSpace::Gray
            | ColorSpace::Cmyk
            | ColorSpace::Cmy
            | ColorSpace::NColor(6) => return Ok(Interpolation::Simplex),
            ColorSpace::Lab
            | ColorSpace::Luv
            | ColorSpace::YCbCr
            | ColorSpace::Yxy
            | ColorSpace::Hls
            | ColorSpace::Hsv => return Ok(Interpolation::Multilinear),
            ColorSpace::NColor(_) => {}
        }

        // Output channel carrying luminance, `None` for the channel average
        let luminance = match output {
            ColorSpace::Rgb
            | ColorSpace::Gray
            | ColorSpace::Cmyk
            | ColorSpace::Cmy
            | ColorSpace::NColor(6) => None,
            ColorSpace::Lab | ColorSpace::Luv | ColorSpace::YCbCr | ColorSpace::Yxy => Some(0),
            ColorSpace::Xyz | ColorSpace::Hls => Some(1),
            ColorSpace::Hsv => Some(2),
            ColorSpace::NColor(_) => return Ok(Interpolation::Multilinear),
        };

        let (min, max) = lut.clut_min_max(luminance)?;
        let delta: Vec<f64> = max
            .position
            .iter()
            .zip(&min.position)
            .map(|(hi, lo)| hi - lo)
            .collect();
        let mut norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
        if norm <= 0.0 {
            norm = 1.0;
        }
        norm *= (delta.len() as f64).sqrt();
        let diagonal = (delta.iter().sum::<f64>() / norm).abs();
        tracing::trace!(?input, ?output, diagonal, "chose interpolation");

        Ok(if diagonal > DIAGONAL_THRESHOLD {
            Interpolation::Simplex
        } else {
            Interpolation::Multilinear
        })
    }
}

/// Grid vertices and weights that make up one interpolated value
#[derive(Debug)]
pub(crate) struct Stencil {
    pub offsets: Vec<usize>,
    pub weights: Vec<f64>,
    pub clipped: bool,
}

/// Largest grid values, as used for ink limiting
#[derive(Debug, Clone, PartialEq)]
pub struct ClutTac {
    /// Largest sum of all channels at any vertex
    pub total: f64,
    /// Largest value of each channel
    pub channel_max: Vec<f64>,
}

/// Position of an extreme CLUT value
#[derive(Debug, Clone, PartialEq)]
pub struct ClutExtreme {
    /// Normalized grid coordinate
    pub position: Vec<f64>,
    pub value: f64,
}

/// A multi-dimensional lookup table
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "LutRepr", into = "LutRepr")
)]
pub struct Lut {
    geometry: Option<LutGeometry>,
    matrix: Option<Matrix3x3>,
    input_curves: Vec<Curve1D>,
    clut: Vec<f64>,
    output_curves: Vec<Curve1D>,
    strides: Vec<usize>,
    cube: Vec<usize>,
    interpolation: Interpolation,
    allocated: bool,
}

impl Lut {
    /// Empty table with no geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Set geometry and allocate in one step
    pub fn with_geometry(geometry: LutGeometry) -> Result<Self> {
        let mut lut = Self::new();
        lut.set_geometry(geometry)?;
        lut.allocate()?;
        Ok(lut)
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn geometry(&self) -> Option<&LutGeometry> {
        self.geometry.as_ref()
    }

    /// Declare the table shape.
    ///
    /// Index tables are recomputed immediately. Storage of a different
    /// shape is released and must be allocated again.
    pub fn set_geometry(&mut self, geometry: LutGeometry) -> Result<()> {
        geometry.validate()?;
        if self.geometry != Some(geometry) {
            self.free();
        }
        if geometry.input_channels != 3 {
            self.matrix = None;
        }
        self.strides = geometry.strides();
        self.cube = geometry.cube_offsets(&self.strides);
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Size all storage for the current geometry.
    ///
    /// Curves start as identity ramps and the grid is zeroed.
    pub fn allocate(&mut self) -> Result<()> {
        let geom = self.geometry.ok_or(LutError::GeometryNotSet)?;
        let clut = try_zeroed(geom.clut_len()?, "clut")?;
        let input_curves = try_filled(
            geom.input_channels,
            Curve1D::identity_table(geom.input_entries)?,
            "input curves",
        )?;
        let output_curves = try_filled(
            geom.output_channels,
            Curve1D::identity_table(geom.output_entries)?,
            "output curves",
        )?;
        self.clut = clut;
        self.input_curves = input_curves;
        self.output_curves = output_curves;
        self.allocated = true;
        tracing::trace!(
            inputs = geom.input_channels,
            outputs = geom.output_channels,
            resolution = geom.resolution,
            "allocated lut"
        );
        Ok(())
    }

    /// Release storage. The geometry is kept.
    pub fn free(&mut self) {
        self.clut = Vec::new();
        self.input_curves = Vec::new();
        self.output_curves = Vec::new();
        self.allocated = false;
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    pub fn matrix(&self) -> Option<&Matrix3x3> {
        self.matrix.as_ref()
    }

    /// Set the input matrix. Only three channel tables carry one.
    pub fn set_matrix(&mut self, matrix: Option<Matrix3x3>) -> Result<()> {
        let geom = self.geometry.ok_or(LutError::GeometryNotSet)?;
        if matrix.is_some() && geom.input_channels != 3 {
            return Err(LutError::ChannelCount {
                expected: 3,
                actual: geom.input_channels,
            });
        }
        self.matrix = matrix;
        Ok(())
    }

    pub fn input_curves(&self) -> &[Curve1D] {
        &self.input_curves
    }

    pub fn input_curves_mut(&mut self) -> &mut [Curve1D] {
        &mut self.input_curves
    }

    pub fn output_curves(&self) -> &[Curve1D] {
        &self.output_curves
    }

    pub fn output_curves_mut(&mut self) -> &mut [Curve1D] {
        &mut self.output_curves
    }

    pub fn clut(&self) -> &[f64] {
        &self.clut
    }

    pub fn clut_mut(&mut self) -> &mut [f64] {
        &mut self.clut
    }

    /// Per-axis element strides
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Element offsets of the corners of a grid cell
    pub fn cube_offsets(&self) -> &[usize] {
        &self.cube
    }

    /// Element offset of the grid vertex at `index`
    pub fn vertex_offset(&self, index: &[usize]) -> Result<usize> {
        let geom = self.allocated_geometry()?;
        check_channels(geom.input_channels, index.len())?;
        let mut offset = 0;
        for (axis, (&i, &stride)) in index.iter().zip(&self.strides).enumerate() {
            if i >= geom.resolution {
                return Err(LutError::VertexOutOfRange {
                    axis,
                    index: i,
                    resolution: geom.resolution,
                });
            }
            offset += i * stride;
        }
        Ok(offset)
    }

    /// Output vector stored at grid vertex `index`
    pub fn vertex(&self, index: &[usize]) -> Result<&[f64]> {
        let offset = self.vertex_offset(index)?;
        let outputs = self.allocated_geometry()?.output_channels;
        Ok(&self.clut[offset..offset + outputs])
    }

    /// Mutable output vector at grid vertex `index`
    pub fn vertex_mut(&mut self, index: &[usize]) -> Result<&mut [f64]> {
        let offset = self.vertex_offset(index)?;
        let outputs = self.allocated_geometry()?.output_channels;
        Ok(&mut self.clut[offset..offset + outputs])
    }

    /// Apply the matrix to a three channel input. Identity when unset.
    pub fn lookup_matrix(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_channels(3, input.len())?;
        check_channels(3, output.len())?;
        let v = [input[0], input[1], input[2]];
        let r = match &self.matrix {
            Some(m) => m.multiply_vec(v),
            None => v,
        };
        output[..3].copy_from_slice(&r);
        Ok(())
    }

    /// Invert the matrix stage. Identity when unset.
    pub fn lookup_matrix_bwd(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_channels(3, input.len())?;
        check_channels(3, output.len())?;
        let v = [input[0], input[1], input[2]];
        let r = match &self.matrix {
            Some(m) => m.inverse().ok_or(LutError::SingularMatrix)?.multiply_vec(v),
            None => v,
        };
        output[..3].copy_from_slice(&r);
        Ok(())
    }

    /// Forward evaluate each input curve. Returns true if any input clamped.
    pub fn lookup_input(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let geom = self.allocated_geometry()?;
        curves_fwd(&self.input_curves, geom.input_channels, input, output)
    }

    /// Backward evaluate each input curve
    pub fn lookup_input_bwd(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let geom = self.allocated_geometry()?;
        curves_bwd(&self.input_curves, geom.input_channels, input, output)
    }

    /// Forward evaluate each output curve
    pub fn lookup_output(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let geom = self.allocated_geometry()?;
        curves_fwd(&self.output_curves, geom.output_channels, input, output)
    }

    /// Backward evaluate each output curve
    pub fn lookup_output_bwd(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let geom = self.allocated_geometry()?;
        curves_bwd(&self.output_curves, geom.output_channels, input, output)
    }

    /// Interpolate the grid with the configured method
    pub fn lookup_clut(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        match self.interpolation {
            Interpolation::Multilinear => self.lookup_clut_nl(input, output),
            Interpolation::Simplex => self.lookup_clut_sx(input, output),
        }
    }

    /// Multilinear grid interpolation
    pub fn lookup_clut_nl(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let stencil = self.stencil(input, Interpolation::Multilinear)?;
        self.blend(&stencil, output)?;
        Ok(stencil.clipped)
    }

    /// Simplex grid interpolation
    pub fn lookup_clut_sx(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let stencil = self.stencil(input, Interpolation::Simplex)?;
        self.blend(&stencil, output)?;
        Ok(stencil.clipped)
    }

    /// Full chain: matrix, input curves, grid, output curves
    pub fn lookup(&self, input: &[f64], output: &mut [f64]) -> Result<bool> {
        let geom = self.allocated_geometry()?;
        check_channels(geom.input_channels, input.len())?;
        check_channels(geom.output_channels, output.len())?;

        let mut stage = [0.0; MAX_CHANNELS];
        let stage = &mut stage[..geom.input_channels];
        match &self.matrix {
            Some(m) if !m.is_identity() => self.lookup_matrix(input, stage)?,
            _ => stage.copy_from_slice(input),
        }

        let mut curved = [0.0; MAX_CHANNELS];
        let curved = &mut curved[..geom.input_channels];
        let mut clipped = self.lookup_input(stage, curved)?;

        let mut grid = [0.0; MAX_CHANNELS];
        let grid = &mut grid[..geom.output_channels];
        clipped |= self.lookup_clut(curved, grid)?;
        clipped |= self.lookup_output(grid, output)?;
        Ok(clipped)
    }

    /// Grid positions of the smallest and largest value of `channel`, or of
    /// the channel average when `channel` is `None`
    pub fn clut_min_max(&self, channel: Option<usize>) -> Result<(ClutExtreme, ClutExtreme)> {
        let geom = self.allocated_geometry()?;
        if let Some(ch) = channel {
            if ch >= geom.output_channels {
                return Err(LutError::ChannelCount {
                    expected: geom.output_channels,
                    actual: ch + 1,
                });
            }
        }

        let outputs = geom.output_channels;
        let mut min = (0, f64::INFINITY);
        let mut max = (0, f64::NEG_INFINITY);
        for (vertex, values) in self.clut.chunks_exact(outputs).enumerate() {
            let v = match channel {
                Some(ch) => values[ch],
                None => values.iter().sum::<f64>() / outputs as f64,
            };
            if v < min.1 {
                min = (vertex, v);
            }
            if v > max.1 {
                max = (vertex, v);
            }
        }

        let position = |vertex: usize| {
            let last = (geom.resolution - 1) as f64;
            let mut pos = vec![0.0; geom.input_channels];
            let mut rest = vertex;
            for p in pos.iter_mut().rev() {
                *p = (rest % geom.resolution) as f64 / last;
                rest /= geom.resolution;
            }
            pos
        };
        Ok((
            ClutExtreme {
                position: position(min.0),
                value: min.1,
            },
            ClutExtreme {
                position: position(max.0),
                value: max.1,
            },
        ))
    }

    /// Total ink limit and per-channel maxima over all grid vertices.
    ///
    /// Both start from 0, so an all negative grid reports 0.
    pub fn clut_tac(&self) -> Result<ClutTac> {
        let geom = self.allocated_geometry()?;
        let mut total: f64 = 0.0;
        let mut channel_max = vec![0.0; geom.output_channels];
        for values in self.clut.chunks_exact(geom.output_channels) {
            let mut sum = 0.0;
            for (m, &v) in channel_max.iter_mut().zip(values) {
                sum += v;
                if v > *m {
                    *m = v;
                }
            }
            total = total.max(sum);
        }
        Ok(ClutTac { total, channel_max })
    }

    pub(crate) fn allocated_geometry(&self) -> Result<&LutGeometry> {
        match &self.geometry {
            Some(geom) if self.allocated => Ok(geom),
            _ => Err(LutError::NotAllocated),
        }
    }

    /// Swap in fully computed contents
    pub(crate) fn commit(
        &mut self,
        input_curves: Vec<Curve1D>,
        clut: Vec<f64>,
        output_curves: Vec<Curve1D>,
    ) {
        self.input_curves = input_curves;
        self.clut = clut;
        self.output_curves = output_curves;
    }

    /// Locate the cell holding `input` and compute the contributing vertices
    pub(crate) fn stencil(&self, input: &[f64], method: Interpolation) -> Result<Stencil> {
        let geom = self.allocated_geometry()?;
        let dims = geom.input_channels;
        check_channels(dims, input.len())?;

        let mut frac = [0.0; MAX_CHANNELS];
        let mut base = 0;
        let mut clipped = false;
        for e in 0..dims {
            let (ix, co, c) = locate(input[e], geom.resolution);
            base += ix * self.strides[e];
            frac[e] = co;
            clipped |= c;
        }
        let frac = &frac[..dims];

        match method {
            Interpolation::Multilinear => {
                let corners = self.cube.len();
                let mut weights = try_zeroed(corners, "corner weights")?;
                corner_weights(frac, &mut weights);
                let mut offsets = try_filled(corners, base, "corner offsets")?;
                for (o, c) in offsets.iter_mut().zip(&self.cube) {
                    *o += c;
                }
                Ok(Stencil {
                    offsets,
                    weights,
                    clipped,
                })
            }
            Interpolation::Simplex => {
                let mut order = [0usize; MAX_CHANNELS];
                let order = &mut order[..dims];
                sort_axes(frac, order);
                let mut weights = try_zeroed(dims + 1, "simplex weights")?;
                simplex_weights(frac, order, &mut weights);
                let mut offsets = try_filled(dims + 1, base, "simplex offsets")?;
                for k in 1..=dims {
                    offsets[k] = offsets[k - 1] + self.strides[order[dims - k]];
                }
                Ok(Stencil {
                    offsets,
                    weights,
                    clipped,
                })
            }
        }
    }

    /// Weighted sum of the stencil's vertex vectors
    pub(crate) fn blend(&self, stencil: &Stencil, output: &mut [f64]) -> Result<()> {
        let outputs = self.allocated_geometry()?.output_channels;
        check_channels(outputs, output.len())?;
        output.fill(0.0);
        for (&offset, &w) in stencil.offsets.iter().zip(&stencil.weights) {
            let vertex = &self.clut[offset..offset + outputs];
            for (o, v) in output.iter_mut().zip(vertex) {
                *o += w * v;
            }
        }
        Ok(())
    }
}

/// Serialized form of a [`Lut`]. Index tables are derived, and storage is
/// only accepted when it matches the geometry.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct LutRepr {
    geometry: Option<LutGeometry>,
    #[serde(default)]
    matrix: Option<Matrix3x3>,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    input_curves: Vec<Curve1D>,
    #[serde(default)]
    clut: Vec<f64>,
    #[serde(default)]
    output_curves: Vec<Curve1D>,
}

#[cfg(feature = "serde")]
impl TryFrom<LutRepr> for Lut {
    type Error = LutError;

    fn try_from(repr: LutRepr) -> Result<Self> {
        let mut lut = Lut::new().with_interpolation(repr.interpolation);
        let unallocated =
            repr.clut.is_empty() && repr.input_curves.is_empty() && repr.output_curves.is_empty();
        let Some(geometry) = repr.geometry else {
            if repr.matrix.is_some() || !unallocated {
                return Err(LutError::GeometryNotSet);
            }
            return Ok(lut);
        };
        lut.set_geometry(geometry)?;
        lut.set_matrix(repr.matrix)?;
        if unallocated {
            return Ok(lut);
        }

        let expected = geometry.clut_len()?;
        if repr.clut.len() != expected {
            return Err(LutError::ClutLength {
                expected,
                actual: repr.clut.len(),
            });
        }
        check_channels(geometry.input_channels, repr.input_curves.len())?;
        check_channels(geometry.output_channels, repr.output_curves.len())?;
        lut.commit(repr.input_curves, repr.clut, repr.output_curves);
        lut.allocated = true;
        Ok(lut)
    }
}

#[cfg(feature = "serde")]
impl From<Lut> for LutRepr {
    fn from(lut: Lut) -> Self {
        Self {
            geometry: lut.geometry,
            matrix: lut.matrix,
            interpolation: lut.interpolation,
            input_curves: lut.input_curves,
            clut: lut.clut,
            output_curves: lut.output_curves,
        }
    }
}

#[inline]
fn check_channels(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LutError::ChannelCount { expected, actual })
    }
}

fn curves_fwd(
    curves: &[Curve1D],
    channels: usize,
    input: &[f64],
    output: &mut [f64],
) -> Result<bool> {
    check_channels(channels, input.len())?;
    check_channels(channels, output.len())?;
    let mut clipped = false;
    for ((curve, &x), y) in curves.iter().zip(input).zip(output.iter_mut()) {
        let (v, c) = curve.lookup_fwd(x);
        *y = v;
        clipped |= c;
    }
    Ok(clipped)
}

fn curves_bwd(
    curves: &[Curve1D],
    channels: usize,
    input: &[f64],
    output: &mut [f64],
) -> Result<bool> {
    check_channels(channels, input.len())?;
    check_channels(channels, output.len())?;
    let mut clipped = false;
    for ((curve, &y), x) in curves.iter().zip(input).zip(output.iter_mut()) {
        let (v, c) = curve.lookup_bwd(y)?;
        *x = v;
        clipped |= c;
    }
    Ok(clipped)
}
