//! # oxlut - ICC lookup table engine
//!
//! The numeric core behind ICC `lut8`/`lut16` style transforms.
//!
//! ## Components
//!
//! - **Curves**: [`Curve1D`] with forward and backward evaluation, backed by a
//!   lazily built [`ReverseIndex1D`] for sampled tables
//! - **Lookup tables**: [`Lut`] with multilinear and simplex interpolation
//!   and local gradient correction ([`Lut::tune_value`])
//! - **Traversal**: [`HilbertSequencer`], a cache friendly grid walk
//! - **Population**: [`MultiLutBuilder`] samples continuous color functions
//!   into one or more tables, with optional anti-banding passes
//!
//! ## Quick Start
//!
//! ```
//! use oxlut_core::{Interpolation, Lut, LutGeometry};
//!
//! // 2D grid, 3 points per axis, one output channel
//! let mut lut = Lut::with_geometry(LutGeometry::new(2, 1, 3))?
//!     .with_interpolation(Interpolation::Simplex);
//! lut.vertex_mut(&[2, 2])?[0] = 1.0;
//!
//! let mut out = [0.0];
//! let clipped = lut.lookup_clut(&[1.0, 0.75], &mut out)?;
//! assert!(!clipped);
//! assert!((out[0] - 0.5).abs() < 1e-12);
//! # Ok::<(), oxlut_core::LutError>(())
//! ```
//!
//! ## Logging
//!
//! Population and index builds emit [`tracing`] events. No subscriber is
//! installed by this crate.

pub mod build;
pub mod curve;
pub mod error;
pub mod hilbert;
pub mod lut;
pub mod math;
pub mod space;

pub use build::{
    ClipStage, GridRequest, MultiLutBuilder, SampleKind, TableFunctions, from_fn,
};
pub use curve::{Curve1D, ReverseIndex1D};
pub use error::{LutError, Result};
pub use hilbert::HilbertSequencer;
pub use lut::{ClutExtreme, ClutTac, Interpolation, Lut, LutGeometry, TuneStatus};
pub use math::Matrix3x3;
pub use space::{ColorSpace, Encoding, LabVersion, Normalization};

/// Largest supported input or output channel count
pub const MAX_CHANNELS: usize = 15;

/// Version of oxlut
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
