//! Bucketed reverse lookup for sampled curves
//!
//! The output range of a table is quantized into buckets. Every segment
//! between two consecutive samples is registered in each bucket its value
//! range touches, so a backward query only scans one short candidate list.
//! Curves need not be monotonic: the first bracketing segment wins.

use crate::error::{LutError, Result};

/// Reverse index over the samples of one table curve
#[derive(Debug, Clone)]
pub struct ReverseIndex1D {
    min: f64,
    max: f64,
    scale: f64,
    buckets: Vec<Vec<usize>>,
}

impl ReverseIndex1D {
    /// Build the index for `samples` (at least two entries)
    pub fn build(samples: &[f64]) -> Result<Self> {
        let n = samples.len();
        if n < 2 {
            return Err(LutError::InvalidTableEntries(n));
        }

        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let bucket_count = (n + 3) / 2;
        let scale = if max > min {
            bucket_count as f64 / (max - min)
        } else {
            0.0
        };

        let mut buckets: Vec<Vec<usize>> = Vec::new();
        buckets
            .try_reserve_exact(bucket_count)
            .map_err(|_| LutError::Allocation("reverse index buckets"))?;
        buckets.resize_with(bucket_count, Vec::new);

        let quantize = |v: f64| (((v - min) * scale) as usize).min(bucket_count - 1);
        for (segment, pair) in samples.windows(2).enumerate() {
            let mut s = quantize(pair[0]);
            let mut e = quantize(pair[1]);
            if s > e {
                std::mem::swap(&mut s, &mut e);
            }
            for bucket in &mut buckets[s..=e] {
                bucket
                    .try_reserve(1)
                    .map_err(|_| LutError::Allocation("reverse index candidate list"))?;
                bucket.push(segment);
            }
        }

        tracing::debug!(
            entries = n,
            buckets = bucket_count,
            min,
            max,
            "built reverse index"
        );

        Ok(Self {
            min,
            max,
            scale,
            buckets,
        })
    }

    /// Smallest sample value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample value
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Candidate segments registered in `bucket`
    pub fn candidates(&self, bucket: usize) -> &[usize] {
        self.buckets.get(bucket).map_or(&[], Vec::as_slice)
    }

    /// Find `x` in `[0, 1]` such that the curve maps `x` to `y`.
    ///
    /// `samples` must be the samples the index was built from. The flag is
    /// set when no segment brackets `y` and the nearest sample was used.
    pub fn lookup(&self, samples: &[f64], y: f64) -> (f64, bool) {
        let n = samples.len();
        let last = (n - 1) as f64;
        let top = (self.buckets.len() - 1) as f64;
        let bucket = ((y - self.min) * self.scale).clamp(0.0, top) as usize;

        for &k in self.candidates(bucket) {
            let lv = samples[k];
            let hv = samples[k + 1];
            if (lv <= y && y <= hv) || (hv <= y && y <= lv) {
                let x = if hv == lv {
                    k as f64 + 0.5
                } else {
                    k as f64 + (y - lv) / (hv - lv)
                };
                return (x / last, false);
            }
        }

        // Out of range or lost to quantization: nearest sample
        let nearest = samples
            .iter()
            .enumerate()
            .fold((0usize, f64::INFINITY), |(bk, bd), (k, &v)| {
                let d = (v - y).abs();
                if d < bd {
                    (k, d)
                } else {
                    (bk, bd)
                }
            })
            .0;
        (nearest as f64 / last, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_bucket_registration() {
        let samples = [0.0, 0.5, 1.0];
        let index = ReverseIndex1D::build(&samples).unwrap();
        assert_eq!(index.bucket_count(), 3);
        // Every segment lands in every bucket its range intersects
        for (k, pair) in samples.windows(2).enumerate() {
            let lo = ((pair[0] - index.min()) * 3.0) as usize;
            let hi = (((pair[1] - index.min()) * 3.0) as usize).min(2);
            for b in lo..=hi {
                assert!(index.candidates(b).contains(&k));
            }
        }
    }

    #[test]
    fn test_linear_inverse() {
        let samples = [0.0, 0.5, 1.0];
        let index = ReverseIndex1D::build(&samples).unwrap();
        let (x, clipped) = index.lookup(&samples, 0.25);
        assert!((x - 0.25).abs() < EPSILON);
        assert!(!clipped);
        let (x, clipped) = index.lookup(&samples, 1.0);
        assert!((x - 1.0).abs() < EPSILON);
        assert!(!clipped);
    }

    #[test]
    fn test_decreasing_curve() {
        let samples = [1.0, 0.6, 0.2, 0.0];
        let index = ReverseIndex1D::build(&samples).unwrap();
        let (x, clipped) = index.lookup(&samples, 0.4);
        assert!((x - 1.5 / 3.0).abs() < EPSILON);
        assert!(!clipped);
    }

    #[test]
    fn test_flat_segment_midpoint() {
        let samples = [0.0, 0.5, 0.5, 1.0];
        let index = ReverseIndex1D::build(&samples).unwrap();
        let (x, clipped) = index.lookup(&samples, 0.5);
        assert!(!clipped);
        // First bracketing segment is 0..1, whose upper endpoint is 0.5
        assert!((x - 1.0 / 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_flat_curve() {
        let samples = [0.3, 0.3, 0.3];
        let index = ReverseIndex1D::build(&samples).unwrap();
        let (x, clipped) = index.lookup(&samples, 0.3);
        assert!((x - 0.25).abs() < EPSILON);
        assert!(!clipped);
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let samples = [0.1, 0.4, 0.9];
        let index = ReverseIndex1D::build(&samples).unwrap();
        let (x, clipped) = index.lookup(&samples, 1.5);
        assert!(clipped);
        assert!((x - 1.0).abs() < EPSILON);
        let (x, clipped) = index.lookup(&samples, -1.0);
        assert!(clipped);
        assert!(x.abs() < EPSILON);
    }

    #[test]
    fn test_too_few_samples() {
        assert_eq!(
            ReverseIndex1D::build(&[0.5]).unwrap_err(),
            LutError::InvalidTableEntries(1)
        );
    }
}
