//! Populating lookup tables from continuous color functions
//!
//! [`MultiLutBuilder`] fills one or more tables of identical geometry in a
//! single grid walk. The caller supplies [`TableFunctions`]:
//!
//! - `input` maps input space values before the grid (input curves)
//! - `clut` produces one output vector per table for each grid request
//! - `output` maps grid values to the output space (output curves)
//!
//! Values handed to the callbacks are in full range units of the declared
//! color spaces. Tables store them normalized to `[0, 1]`.
//!
//! # Example
//!
//! ```
//! use oxlut_core::build::{from_fn, ClipStage, MultiLutBuilder};
//! use oxlut_core::{ColorSpace, Lut, LutGeometry};
//!
//! let mut lut = Lut::with_geometry(LutGeometry::new(3, 3, 9)).unwrap();
//! let invert = from_fn(|req, out, _radii| {
//!     for (o, p) in out.iter_mut().zip(req.position) {
//!         *o = 1.0 - p;
//!     }
//! });
//! let clip = MultiLutBuilder::new(ColorSpace::Rgb, ColorSpace::Rgb)
//!     .populate(&mut [&mut lut], &invert)
//!     .unwrap();
//! assert_eq!(clip, ClipStage::None);
//! ```

mod clip;
mod smooth;

pub use clip::{CLIP_MARGIN, ClipStage};
pub use smooth::{LEAST_SQUARES_THRESHOLD, LEAST_SQUARES_WEIGHT};

use crate::MAX_CHANNELS;
use crate::curve::Curve1D;
use crate::error::{LutError, Result, try_zeroed};
use crate::hilbert::HilbertSequencer;
use crate::lut::{Lut, LutGeometry};
use crate::space::{ColorSpace, Encoding, LabVersion, Normalization};
use clip::clamp_unit;
use smooth::GridShape;

/// Default resolution from which Lab/Luv inputs get a neutral aligned grid
pub const NEUTRAL_ALIGN_MIN_RESOLUTION: usize = 9;

/// Default output channel count at or below which the least squares
/// discrepancy check is skipped
pub const LEAST_SQUARES_UNCHECKED_CHANNELS: usize = 3;

/// What the grid walk is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// A grid vertex
    Vertex,
    /// The center of the cell whose lower corner is `index`
    CellCenter,
}

/// One grid sample request
#[derive(Debug, Clone, Copy)]
pub struct GridRequest<'a> {
    pub kind: SampleKind,
    /// Grid index of the vertex, or of the cell's lower corner
    pub index: &'a [usize],
    /// Input value in full range units of the input space
    pub position: &'a [f64],
}

/// Continuous functions a set of tables is sampled from
pub trait TableFunctions {
    /// Input space to grid input space, for table `table`. Identity by default.
    fn input(&self, table: usize, values: &mut [f64]) {
        let _ = (table, values);
    }

    /// Grid function.
    ///
    /// `outputs` holds one output vector per table, back to back. `radii`
    /// holds one smoothing radius per table in normalized input units; all
    /// start at zero and only matter when filtering is enabled.
    fn clut(&self, request: GridRequest<'_>, outputs: &mut [f64], radii: &mut [f64]);

    /// Grid output space to output space, for table `table`. Identity by default.
    fn output(&self, table: usize, values: &mut [f64]) {
        let _ = (table, values);
    }
}

/// [`TableFunctions`] made of a single grid closure
#[derive(Debug, Clone, Copy)]
pub struct FnTable<F>(F);

/// Wrap a grid closure, with identity input and output curves
pub fn from_fn<F>(f: F) -> FnTable<F>
where
    F: Fn(GridRequest<'_>, &mut [f64], &mut [f64]),
{
    FnTable(f)
}

impl<F> TableFunctions for FnTable<F>
where
    F: Fn(GridRequest<'_>, &mut [f64], &mut [f64]),
{
    fn clut(&self, request: GridRequest<'_>, outputs: &mut [f64], radii: &mut [f64]) {
        (self.0)(request, outputs, radii)
    }
}

/// Population options
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiLutBuilder {
    input_space: ColorSpace,
    output_space: ColorSpace,
    input_encoding: Encoding,
    output_encoding: Encoding,
    lab_version: LabVersion,
    input_range: Option<Normalization>,
    clut_range: Option<Normalization>,
    least_squares: bool,
    least_squares_bounds: Option<(usize, usize)>,
    least_squares_unchecked_channels: usize,
    filter: bool,
    neutral_align_min_resolution: usize,
}

impl MultiLutBuilder {
    pub fn new(input_space: ColorSpace, output_space: ColorSpace) -> Self {
        Self {
            input_space,
            output_space,
            input_encoding: Encoding::default(),
            output_encoding: Encoding::default(),
            lab_version: LabVersion::default(),
            input_range: None,
            clut_range: None,
            least_squares: false,
            least_squares_bounds: None,
            least_squares_unchecked_channels: LEAST_SQUARES_UNCHECKED_CHANNELS,
            filter: false,
            neutral_align_min_resolution: NEUTRAL_ALIGN_MIN_RESOLUTION,
        }
    }

    /// Encoding of both sides
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.input_encoding = encoding;
        self.output_encoding = encoding;
        self
    }

    pub fn with_input_encoding(mut self, encoding: Encoding) -> Self {
        self.input_encoding = encoding;
        self
    }

    pub fn with_output_encoding(mut self, encoding: Encoding) -> Self {
        self.output_encoding = encoding;
        self
    }

    pub fn with_lab_version(mut self, version: LabVersion) -> Self {
        self.lab_version = version;
        self
    }

    /// Full range spanned by the grid inputs, instead of the input space's
    pub fn with_input_range(mut self, range: Normalization) -> Self {
        self.input_range = Some(range);
        self
    }

    /// Full range of the values stored in the grid, instead of the output
    /// space's
    pub fn with_clut_range(mut self, range: Normalization) -> Self {
        self.clut_range = Some(range);
        self
    }

    /// Sample cell centers and pull vertices toward them
    pub fn with_least_squares(mut self, enabled: bool) -> Self {
        self.least_squares = enabled;
        self
    }

    /// Grid index range `gmin..gmax` of cells used by the least squares pass
    pub fn with_least_squares_bounds(mut self, gmin: usize, gmax: usize) -> Self {
        self.least_squares_bounds = Some((gmin, gmax));
        self
    }

    /// Output channel count at or below which the discrepancy threshold is
    /// not applied. Zero applies it to every table.
    pub fn with_least_squares_unchecked_channels(mut self, channels: usize) -> Self {
        self.least_squares_unchecked_channels = channels;
        self
    }

    /// Smooth vertices whose grid callback returned a radius
    pub fn with_filter(mut self, enabled: bool) -> Self {
        self.filter = enabled;
        self
    }

    /// Smallest resolution at which Lab/Luv chroma ranges are widened
    pub fn with_neutral_align_min_resolution(mut self, resolution: usize) -> Self {
        self.neutral_align_min_resolution = resolution;
        self
    }

    /// Sample the functions into every table of `luts`.
    ///
    /// All tables must be allocated with the same geometry. On error no
    /// table is modified. On success returns the latest stage that had to
    /// clamp a value.
    pub fn populate<T>(&self, luts: &mut [&mut Lut], funcs: &T) -> Result<ClipStage>
    where
        T: TableFunctions + ?Sized,
    {
        let geom = self.check_tables(luts)?;
        let ranges = self.resolve_ranges(&geom)?;
        let tables = luts.len();
        let shape = GridShape::new(&geom);
        let mut clip = ClipStage::None;

        let mut inputs = Vec::with_capacity(tables);
        for t in 0..tables {
            let (curves, clipped) = sample_input_curves(&geom, &ranges, t, funcs)?;
            clip.record(ClipStage::InputTable, clipped);
            inputs.push(curves);
        }

        let grids = self.sample_grid(&geom, &shape, &ranges, tables, funcs, &mut clip)?;

        let mut outputs = Vec::with_capacity(tables);
        for t in 0..tables {
            let (curves, clipped) = sample_output_curves(&geom, &ranges, t, funcs)?;
            clip.record(ClipStage::OutputTable, clipped);
            outputs.push(curves);
        }

        for (lut, ((input, clut), output)) in luts
            .iter_mut()
            .zip(inputs.into_iter().zip(grids).zip(outputs))
        {
            lut.commit(input, clut, output);
        }

        tracing::debug!(
            tables,
            inputs = geom.input_channels,
            outputs = geom.output_channels,
            resolution = geom.resolution,
            ?clip,
            "populated lookup tables"
        );
        if clip != ClipStage::None {
            tracing::warn!(?clip, "values clipped while populating lookup tables");
        }
        Ok(clip)
    }

    fn check_tables(&self, luts: &[&mut Lut]) -> Result<LutGeometry> {
        let first = luts.first().ok_or(LutError::NoTables)?;
        let geom = *first.allocated_geometry()?;
        for (t, lut) in luts.iter().enumerate().skip(1) {
            let other = lut.allocated_geometry()?;
            let reason = if other.input_channels != geom.input_channels {
                Some("input channel count")
            } else if other.output_channels != geom.output_channels {
                Some("output channel count")
            } else if other.resolution != geom.resolution {
                Some("grid resolution")
            } else if other.input_entries != geom.input_entries
                || other.output_entries != geom.output_entries
            {
                Some("curve length")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(LutError::GeometryMismatch {
                    table: t,
                    reason: reason.to_string(),
                });
            }
        }

        for (space, channels) in [
            (self.input_space, geom.input_channels),
            (self.output_space, geom.output_channels),
        ] {
            if space.channels() != channels {
                return Err(LutError::ChannelCount {
                    expected: channels,
                    actual: space.channels(),
                });
            }
        }
        Ok(geom)
    }

    fn resolve_ranges(&self, geom: &LutGeometry) -> Result<Ranges> {
        let input = self
            .input_space
            .normalization(self.input_encoding, self.lab_version)?;
        let output = self
            .output_space
            .normalization(self.output_encoding, self.lab_version)?;

        let grid_input = match &self.input_range {
            Some(range) => range.clone(),
            None => {
                let mut range = input.clone();
                if self.input_space.is_lightness_chroma()
                    && geom.resolution >= self.neutral_align_min_resolution
                {
                    range.align_neutral(1..3, geom.resolution);
                }
                range
            }
        };
        let grid_output = self.clut_range.clone().unwrap_or_else(|| output.clone());

        for (range, channels) in [
            (&grid_input, geom.input_channels),
            (&grid_output, geom.output_channels),
        ] {
            if range.channels() != channels {
                return Err(LutError::ChannelCount {
                    expected: channels,
                    actual: range.channels(),
                });
            }
        }

        Ok(Ranges {
            input,
            grid_input,
            grid_output,
            output,
        })
    }

    /// Walk the grid, then run the anti-banding passes on each table
    fn sample_grid<T>(
        &self,
        geom: &LutGeometry,
        shape: &GridShape,
        ranges: &Ranges,
        tables: usize,
        funcs: &T,
        clip: &mut ClipStage,
    ) -> Result<Vec<Vec<f64>>>
    where
        T: TableFunctions + ?Sized,
    {
        let len = geom.clut_len()?;
        let vertices = geom.vertex_count()?;
        let outputs = geom.output_channels;
        let last = (geom.resolution - 1) as f64;
        let (gmin, gmax) = self.least_squares_range(geom);

        let mut grids = Vec::with_capacity(tables);
        let mut centers = Vec::new();
        let mut radii = Vec::new();
        let mut overshoot = Vec::new();
        for _ in 0..tables {
            grids.push(try_zeroed(len, "clut staging")?);
            if self.least_squares {
                centers.push(try_zeroed(len, "cell centers")?);
            }
            if self.filter {
                radii.push(try_zeroed(vertices, "filter radii")?);
                overshoot.push(try_zeroed(len, "filter overshoot")?);
            }
        }

        let mut out = try_zeroed(tables * outputs, "grid outputs")?;
        let mut rad = try_zeroed(tables, "grid radii")?;
        let mut position = [0.0; MAX_CHANNELS];
        let position = &mut position[..geom.input_channels];
        let mut grid_clip = false;
        let mut center_clip = false;

        let walk = HilbertSequencer::uniform(geom.input_channels, geom.resolution)?.walk();
        for index in walk {
            let offset = shape.offset(&index);

            for (p, &i) in position.iter_mut().zip(&index) {
                *p = i as f64 / last;
            }
            ranges.grid_input.denormalize(position);
            out.fill(0.0);
            rad.fill(0.0);
            funcs.clut(
                GridRequest {
                    kind: SampleKind::Vertex,
                    index: &index,
                    position,
                },
                &mut out,
                &mut rad,
            );
            let slot = offset..offset + outputs;
            for t in 0..tables {
                let values = &mut out[t * outputs..(t + 1) * outputs];
                ranges.grid_output.normalize(values);
                if self.filter {
                    overshoot[t][slot.clone()].copy_from_slice(values);
                }
                grid_clip |= clamp_unit(values);
                grids[t][slot.clone()].copy_from_slice(values);
                if self.filter {
                    for (o, v) in overshoot[t][slot.clone()].iter_mut().zip(values.iter()) {
                        *o = if o.is_finite() { *o - v } else { 0.0 };
                    }
                    radii[t][offset / outputs] = rad[t];
                }
            }

            if self.least_squares && index.iter().all(|&i| gmin <= i && i < gmax) {
                for (p, &i) in position.iter_mut().zip(&index) {
                    *p = (i as f64 + 0.5) / last;
                }
                ranges.grid_input.denormalize(position);
                out.fill(0.0);
                rad.fill(0.0);
                funcs.clut(
                    GridRequest {
                        kind: SampleKind::CellCenter,
                        index: &index,
                        position,
                    },
                    &mut out,
                    &mut rad,
                );
                for t in 0..tables {
                    let values = &mut out[t * outputs..(t + 1) * outputs];
                    ranges.grid_output.normalize(values);
                    center_clip |= clamp_unit(values);
                    centers[t][offset..offset + outputs].copy_from_slice(values);
                }
            }
        }
        clip.record(ClipStage::Grid, grid_clip);
        clip.record(ClipStage::GridMidpoint, center_clip);
        tracing::trace!(vertices, tables, "sampled grid");

        for (t, grid) in grids.iter_mut().enumerate() {
            if self.least_squares {
                let clipped = smooth::least_squares(
                    shape,
                    grid,
                    &centers[t],
                    (gmin, gmax),
                    self.least_squares_unchecked_channels,
                );
                clip.record(ClipStage::GridMidpoint, clipped);
            }
            if self.filter {
                let clipped = smooth::filter(shape, grid, &overshoot[t], &radii[t])?;
                clip.record(ClipStage::MidpointInterp, clipped);
            }
        }
        Ok(grids)
    }

    /// Cell range sampled at its center, clamped to the grid's cells
    fn least_squares_range(&self, geom: &LutGeometry) -> (usize, usize) {
        let cells = geom.resolution - 1;
        match self.least_squares_bounds {
            Some((gmin, gmax)) => (gmin.min(cells), gmax.min(cells)),
            None => (0, cells),
        }
    }
}

/// Normalizations between the four value domains of a table
#[derive(Debug)]
struct Ranges {
    /// Input space
    input: Normalization,
    /// Grid input axes
    grid_input: Normalization,
    /// Values stored in the grid
    grid_output: Normalization,
    /// Output space
    output: Normalization,
}

fn sample_input_curves<T>(
    geom: &LutGeometry,
    ranges: &Ranges,
    table: usize,
    funcs: &T,
) -> Result<(Vec<Curve1D>, bool)>
where
    T: TableFunctions + ?Sized,
{
    sample_curves(
        geom.input_channels,
        geom.input_entries,
        |values| {
            ranges.input.denormalize(values);
            funcs.input(table, values);
            ranges.grid_input.normalize(values);
        },
    )
}

fn sample_output_curves<T>(
    geom: &LutGeometry,
    ranges: &Ranges,
    table: usize,
    funcs: &T,
) -> Result<(Vec<Curve1D>, bool)>
where
    T: TableFunctions + ?Sized,
{
    sample_curves(
        geom.output_channels,
        geom.output_entries,
        |values| {
            ranges.grid_output.denormalize(values);
            funcs.output(table, values);
            ranges.output.normalize(values);
        },
    )
}

/// Sample a per-channel mapping at `entries` evenly spaced points
fn sample_curves(
    channels: usize,
    entries: usize,
    mut map: impl FnMut(&mut [f64]),
) -> Result<(Vec<Curve1D>, bool)> {
    let mut samples = Vec::with_capacity(channels);
    for _ in 0..channels {
        samples.push(try_zeroed(entries, "curve samples")?);
    }

    let last = (entries - 1) as f64;
    let mut values = [0.0; MAX_CHANNELS];
    let values = &mut values[..channels];
    let mut clipped = false;
    for i in 0..entries {
        values.fill(i as f64 / last);
        map(values);
        clipped |= clamp_unit(values);
        for (curve, &v) in samples.iter_mut().zip(values.iter()) {
            curve[i] = v;
        }
    }

    let curves = samples.into_iter().map(Curve1D::table).collect();
    Ok((curves, clipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn rgb_lut(resolution: usize) -> Lut {
        Lut::with_geometry(LutGeometry::new(3, 3, resolution)).unwrap()
    }

    #[test]
    fn test_identity_grid() {
        let mut lut = rgb_lut(5);
        let identity = from_fn(|req, out, _| out.copy_from_slice(req.position));
        let clip = MultiLutBuilder::new(ColorSpace::Rgb, ColorSpace::Rgb)
            .populate(&mut [&mut lut], &identity)
            .unwrap();
        assert_eq!(clip, ClipStage::None);

        let v = lut.vertex(&[1, 2, 4]).unwrap();
        assert!((v[0] - 0.25).abs() < EPSILON);
        assert!((v[1] - 0.5).abs() < EPSILON);
        assert!((v[2] - 1.0).abs() < EPSILON);
        assert!((lut.input_curves()[0].lookup_fwd(0.3).0 - 0.3).abs() < EPSILON);
    }

    #[test]
    fn test_grid_clip_reported() {
        let mut lut = rgb_lut(3);
        let boost = from_fn(|req, out, _| {
            for (o, p) in out.iter_mut().zip(req.position) {
                *o = p * 1.5;
            }
        });
        let clip = MultiLutBuilder::new(ColorSpace::Rgb, ColorSpace::Rgb)
            .populate(&mut [&mut lut], &boost)
            .unwrap();
        assert_eq!(clip, ClipStage::Grid);
        assert!(lut.clut().iter().all(|&v| v <= 1.0));
    }

    #[test]
    fn test_output_table_clip_wins() {
        struct Shifted;
        impl TableFunctions for Shifted {
            fn clut(&self, req: GridRequest<'_>, out: &mut [f64], _: &mut [f64]) {
                out.copy_from_slice(req.position);
            }
            fn input(&self, _: usize, values: &mut [f64]) {
                values.iter_mut().for_each(|v| *v -= 0.1);
            }
            fn output(&self, _: usize, values: &mut [f64]) {
                values.iter_mut().for_each(|v| *v += 0.1);
            }
        }
        let mut lut = rgb_lut(3);
        let clip = MultiLutBuilder::new(ColorSpace::Rgb, ColorSpace::Rgb)
            .populate(&mut [&mut lut], &Shifted)
            .unwrap();
        assert_eq!(clip, ClipStage::OutputTable);
        let (y, _) = lut.input_curves()[0].lookup_fwd(0.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_cell_centers_requested() {
        use std::cell::Cell;
        let centers = Cell::new(0usize);
        let vertices = Cell::new(0usize);
        let funcs = from_fn(|req, out, _| {
            match req.kind {
                SampleKind::Vertex => vertices.set(vertices.get() + 1),
                SampleKind::CellCenter => centers.set(centers.get() + 1),
            }
            out.copy_from_slice(req.position);
        });
        let mut lut = rgb_lut(4);
        MultiLutBuilder::new(ColorSpace::Rgb, ColorSpace::Rgb)
            .with_least_squares(true)
            .populate(&mut [&mut lut], &funcs)
            .unwrap();
        assert_eq!(vertices.get(), 64);
        assert_eq!(centers.get(), 27);
    }

    #[test]
    fn test_neutral_alignment() {
        let builder = MultiLutBuilder::new(ColorSpace::Lab, ColorSpace::Rgb);
        let geom = LutGeometry::new(3, 3, 16);
        let ranges = builder.resolve_ranges(&geom).unwrap();
        let mut neutral = [50.0, 0.0, 0.0];
        ranges.grid_input.normalize(&mut neutral);
        let steps = neutral[1] * 15.0;
        assert!((steps - steps.round()).abs() < EPSILON);

        let low = LutGeometry::new(3, 3, 8);
        let ranges = builder.resolve_ranges(&low).unwrap();
        assert_eq!(ranges.grid_input, ranges.input);
    }

    #[test]
    fn test_float_pcs_rejected() {
        let mut lut = rgb_lut(3);
        let before = lut.clut().to_vec();
        let funcs = from_fn(|_, out, _| out.fill(1.0));
        let err = MultiLutBuilder::new(ColorSpace::Xyz, ColorSpace::Rgb)
            .with_input_encoding(Encoding::Float32)
            .populate(&mut [&mut lut], &funcs)
            .unwrap_err();
        assert!(matches!(err, LutError::UnsupportedColorSpace(_)));
        assert_eq!(lut.clut(), &before[..]);
    }

    #[test]
    fn test_no_tables() {
        let funcs = from_fn(|_, _, _| {});
        assert_eq!(
            MultiLutBuilder::new(ColorSpace::Rgb, ColorSpace::Rgb).populate(&mut [], &funcs),
            Err(LutError::NoTables)
        );
    }
}
