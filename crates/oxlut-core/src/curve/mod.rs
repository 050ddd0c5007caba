//! One dimensional curves
//!
//! A [`Curve1D`] is a single channel transform over the normalized `[0, 1]`
//! domain. Table curves keep a lazily built [`ReverseIndex1D`] for backward
//! evaluation; the cache is dropped whenever the samples are mutated.

mod reverse;

pub use reverse::ReverseIndex1D;

use std::sync::OnceLock;

use crate::error::{LutError, Result};
use crate::math::{lerp, locate};

/// A single channel curve
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "CurveRepr", into = "CurveRepr")
)]
pub enum Curve1D {
    /// Identity curve
    Linear,
    /// Power curve `y = x^g`
    Gamma(f64),
    /// Sampled curve, index `0..N-1` spans `[0, 1]`
    Table(TableCurve),
}

impl Default for Curve1D {
    fn default() -> Self {
        Curve1D::Linear
    }
}

/// Samples of a table curve plus their reverse lookup cache
#[derive(Debug, Clone)]
pub struct TableCurve {
    samples: Vec<f64>,
    reverse: OnceLock<ReverseIndex1D>,
}

/// Serialized form of a curve. Tables are rebuilt through
/// [`Curve1D::table`] so short sample lists get the same treatment as at
/// construction.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
enum CurveRepr {
    Linear,
    Gamma(f64),
    Table { samples: Vec<f64> },
}

#[cfg(feature = "serde")]
impl From<CurveRepr> for Curve1D {
    fn from(repr: CurveRepr) -> Self {
        match repr {
            CurveRepr::Linear => Curve1D::Linear,
            CurveRepr::Gamma(g) => Curve1D::Gamma(g),
            CurveRepr::Table { samples } => Curve1D::table(samples),
        }
    }
}

#[cfg(feature = "serde")]
impl From<Curve1D> for CurveRepr {
    fn from(curve: Curve1D) -> Self {
        match curve {
            Curve1D::Linear => CurveRepr::Linear,
            Curve1D::Gamma(g) => CurveRepr::Gamma(g),
            Curve1D::Table(table) => CurveRepr::Table {
                samples: table.samples,
            },
        }
    }
}

impl PartialEq for TableCurve {
    fn eq(&self, other: &Self) -> bool {
        self.samples == other.samples
    }
}

impl TableCurve {
    fn new(samples: Vec<f64>) -> Self {
        Self {
            samples,
            reverse: OnceLock::new(),
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    fn reverse_index(&self) -> Result<&ReverseIndex1D> {
        if let Some(index) = self.reverse.get() {
            return Ok(index);
        }
        let built = ReverseIndex1D::build(&self.samples)?;
        Ok(self.reverse.get_or_init(|| built))
    }
}

impl Curve1D {
    /// Table curve from normalized samples.
    ///
    /// An empty table is the identity and a single sample is a flat curve.
    pub fn table(samples: Vec<f64>) -> Self {
        match samples.len() {
            0 => Curve1D::Linear,
            1 => Curve1D::Table(TableCurve::new(vec![samples[0]; 2])),
            _ => Curve1D::Table(TableCurve::new(samples)),
        }
    }

    /// Identity ramp with `entries` samples
    pub fn identity_table(entries: usize) -> Result<Self> {
        if entries < 2 {
            return Err(LutError::InvalidTableEntries(entries));
        }
        let last = (entries - 1) as f64;
        Ok(Self::table((0..entries).map(|i| i as f64 / last).collect()))
    }

    /// Create from 8-bit table
    pub fn from_u8_table(table: &[u8]) -> Self {
        Self::table(table.iter().map(|&v| v as f64 / 255.0).collect())
    }

    /// Create from 16-bit table
    pub fn from_u16_table(table: &[u16]) -> Self {
        Self::table(table.iter().map(|&v| v as f64 / 65535.0).collect())
    }

    /// Table samples, `None` for analytic curves
    pub fn samples(&self) -> Option<&[f64]> {
        match self {
            Curve1D::Table(table) => Some(table.samples()),
            _ => None,
        }
    }

    /// Mutable table samples. Drops the cached reverse index.
    pub fn samples_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Curve1D::Table(table) => {
                table.reverse.take();
                Some(&mut table.samples)
            }
            _ => None,
        }
    }

    /// Number of samples of a table curve
    pub fn entries(&self) -> Option<usize> {
        self.samples().map(<[f64]>::len)
    }

    /// Whether the curve maps every input to itself
    pub fn is_identity(&self) -> bool {
        match self {
            Curve1D::Linear => true,
            Curve1D::Gamma(g) => *g == 1.0,
            Curve1D::Table(table) => table.samples == [0.0, 1.0],
        }
    }

    /// Build the reverse index now instead of on the first backward lookup
    pub fn build_reverse_index(&self) -> Result<()> {
        if let Curve1D::Table(table) = self {
            table.reverse_index()?;
        }
        Ok(())
    }

    /// Whether a reverse index is currently cached
    pub fn has_reverse_index(&self) -> bool {
        matches!(self, Curve1D::Table(table) if table.reverse.get().is_some())
    }

    /// Evaluate the curve at `x`. The flag is set when `x` was clamped.
    #[inline]
    pub fn lookup_fwd(&self, x: f64) -> (f64, bool) {
        match self {
            Curve1D::Linear => (x, false),
            Curve1D::Gamma(g) => (if x > 0.0 { x.powf(*g) } else { 0.0 }, false),
            Curve1D::Table(table) => {
                let s = &table.samples;
                let (ix, frac, clipped) = locate(x, s.len());
                (lerp(s[ix], s[ix + 1], frac), clipped)
            }
        }
    }

    /// Find the input that produces `y`.
    ///
    /// Table curves build their reverse index on first use. The flag is set
    /// when no table segment brackets `y`.
    pub fn lookup_bwd(&self, y: f64) -> Result<(f64, bool)> {
        match self {
            Curve1D::Linear => Ok((y, false)),
            Curve1D::Gamma(g) => Ok((if y > 0.0 { y.powf(1.0 / g) } else { 0.0 }, false)),
            Curve1D::Table(table) => Ok(table.reverse_index()?.lookup(&table.samples, y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_linear() {
        let c = Curve1D::Linear;
        assert_eq!(c.lookup_fwd(0.3), (0.3, false));
        assert_eq!(c.lookup_bwd(0.7).unwrap(), (0.7, false));
        assert!(c.is_identity());
    }

    #[test]
    fn test_gamma() {
        let c = Curve1D::Gamma(2.2);
        let (y, _) = c.lookup_fwd(0.5);
        assert!((y - 0.5f64.powf(2.2)).abs() < EPSILON);
        let (x, _) = c.lookup_bwd(y).unwrap();
        assert!((x - 0.5).abs() < EPSILON);
        assert_eq!(c.lookup_fwd(-0.1), (0.0, false));
        assert_eq!(c.lookup_bwd(0.0).unwrap(), (0.0, false));
    }

    #[test]
    fn test_table_three_points() {
        let c = Curve1D::table(vec![0.0, 0.5, 1.0]);
        let (y, clipped) = c.lookup_fwd(0.25);
        assert!((y - 0.25).abs() < EPSILON);
        assert!(!clipped);
        let (x, clipped) = c.lookup_bwd(0.25).unwrap();
        assert!((x - 0.25).abs() < EPSILON);
        assert!(!clipped);
    }

    #[test]
    fn test_table_clamps() {
        let c = Curve1D::table(vec![0.2, 0.8]);
        assert_eq!(c.lookup_fwd(-1.0), (0.2, true));
        let (y, clipped) = c.lookup_fwd(2.0);
        assert!((y - 0.8).abs() < EPSILON);
        assert!(clipped);
        let (y, clipped) = c.lookup_fwd(1.0);
        assert!((y - 0.8).abs() < EPSILON);
        assert!(!clipped);
    }

    #[test]
    fn test_degenerate_tables() {
        assert_eq!(Curve1D::table(Vec::new()), Curve1D::Linear);
        assert_eq!(Curve1D::table(vec![0.4]).samples(), Some(&[0.4, 0.4][..]));
        assert!(Curve1D::identity_table(1).is_err());
        assert!(Curve1D::identity_table(2).unwrap().is_identity());
    }

    #[test]
    fn test_mutation_invalidates_reverse_index() {
        let mut c = Curve1D::identity_table(5).unwrap();
        c.build_reverse_index().unwrap();
        assert!(c.has_reverse_index());

        let samples = c.samples_mut().unwrap();
        for v in samples.iter_mut() {
            *v = 1.0 - *v;
        }
        assert!(!c.has_reverse_index());

        let (x, clipped) = c.lookup_bwd(0.25).unwrap();
        assert!(!clipped);
        assert!((x - 0.75).abs() < EPSILON);
        assert!(c.has_reverse_index());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rebuilds_tables() {
        let c: Curve1D = serde_json::from_str(r#"{"Table":{"samples":[]}}"#).unwrap();
        assert_eq!(c, Curve1D::Linear);
        let c: Curve1D = serde_json::from_str(r#"{"Table":{"samples":[0.3]}}"#).unwrap();
        assert_eq!(c.lookup_fwd(0.5), (0.3, false));

        let ramp = Curve1D::identity_table(5).unwrap();
        ramp.build_reverse_index().unwrap();
        let back: Curve1D = serde_json::from_str(&serde_json::to_string(&ramp).unwrap()).unwrap();
        assert_eq!(back, ramp);
        assert!(!back.has_reverse_index());
    }

    #[test]
    fn test_u16_table() {
        let c = Curve1D::from_u16_table(&[0, 32768, 65535]);
        assert_eq!(c.entries(), Some(3));
        let (y, _) = c.lookup_fwd(1.0);
        assert!((y - 1.0).abs() < EPSILON);
    }
}
