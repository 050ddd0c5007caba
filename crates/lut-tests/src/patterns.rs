//! Test pattern generation
//!
//! Seeded generators for grids, curves and sample points so that every
//! randomized test is reproducible.

use anyhow::Context;
use oxlut_core::{Curve1D, Lut, LutGeometry};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Sample point patterns
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Exactly on grid vertices
    Vertices,
    /// Every axis shares the same fractional offset within its cell
    Diagonal(f64),
    /// Uniform random points in the unit cube
    Random(u64),
    /// Points slightly outside the unit cube
    OutOfRange(u64),
}

/// Generate `count` sample points of dimension `dims` for a grid with
/// `resolution` points per axis.
///
/// Grid aligned patterns use resolutions where `resolution - 1` is a power
/// of two, so the coordinates are exact in binary.
pub fn sample_points(
    pattern: TestPattern,
    dims: usize,
    resolution: usize,
    count: usize,
) -> Vec<Vec<f64>> {
    let last = (resolution - 1) as f64;
    match pattern {
        TestPattern::Vertices => {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            (0..count)
                .map(|_| {
                    (0..dims)
                        .map(|_| rng.gen_range(0..resolution) as f64 / last)
                        .collect()
                })
                .collect()
        }
        TestPattern::Diagonal(frac) => {
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            (0..count)
                .map(|_| {
                    (0..dims)
                        .map(|_| (rng.gen_range(0..resolution - 1) as f64 + frac) / last)
                        .collect()
                })
                .collect()
        }
        TestPattern::Random(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..count)
                .map(|_| (0..dims).map(|_| rng.r#gen::<f64>()).collect())
                .collect()
        }
        TestPattern::OutOfRange(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..count)
                .map(|_| (0..dims).map(|_| rng.gen_range(-0.5..1.5)).collect())
                .collect()
        }
    }
}

/// Allocated table with uniformly random grid values
pub fn random_lut(geometry: LutGeometry, seed: u64) -> anyhow::Result<Lut> {
    let mut lut = Lut::with_geometry(geometry)
        .with_context(|| format!("allocating {geometry:?}"))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for v in lut.clut_mut() {
        *v = rng.r#gen();
    }
    Ok(lut)
}

/// Strictly increasing table curve from 0 to 1 with random step sizes
pub fn monotonic_curve(entries: usize, seed: u64) -> Curve1D {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let steps: Vec<f64> = (1..entries).map(|_| rng.gen_range(0.1..1.0)).collect();
    let total: f64 = steps.iter().sum();
    let mut samples = Vec::with_capacity(entries);
    let mut acc = 0.0;
    samples.push(0.0);
    for s in &steps {
        acc += s;
        samples.push(acc / total);
    }
    Curve1D::table(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_deterministic() {
        let a = sample_points(TestPattern::Random(42), 3, 9, 10);
        let b = sample_points(TestPattern::Random(42), 3, 9, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_vertices_on_grid() {
        for p in sample_points(TestPattern::Vertices, 4, 5, 20) {
            for x in p {
                assert_eq!((x * 4.0).fract(), 0.0);
            }
        }
    }

    #[test]
    fn test_monotonic_curve() {
        let curve = monotonic_curve(33, 3);
        let samples = curve.samples().unwrap();
        assert_eq!(samples.len(), 33);
        assert!(samples.windows(2).all(|w| w[1] > w[0]));
        assert!((samples[32] - 1.0).abs() < 1e-12);
    }
}
