//! Accuracy measurement for interpolated output
//!
//! Differences are measured per channel as absolute error in the normalized
//! `[0, 1]` domain. A 16 bit table step is about `1.5e-5`.

/// Statistics from comparing two output buffers
#[derive(Debug, Clone)]
pub struct ErrorStats {
    /// Mean absolute error across all samples
    pub mean: f64,
    /// Maximum absolute error
    pub max: f64,
    /// 95th percentile absolute error
    pub p95: f64,
    /// Number of samples
    pub count: usize,
}

impl ErrorStats {
    /// Below one 16 bit code value everywhere
    pub fn is_exact_16bit(&self) -> bool {
        self.max < 1.0 / 65535.0
    }

    /// Below one 8 bit code value everywhere
    pub fn is_exact_8bit(&self) -> bool {
        self.max < 1.0 / 255.0
    }
}

/// Compare two equally sized output buffers
pub fn compare_outputs(reference: &[f64], result: &[f64]) -> ErrorStats {
    assert_eq!(reference.len(), result.len());

    let mut errors: Vec<f64> = reference
        .iter()
        .zip(result)
        .map(|(a, b)| (a - b).abs())
        .collect();
    errors.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = errors.len();
    let mean = if count == 0 {
        0.0
    } else {
        errors.iter().sum::<f64>() / count as f64
    };
    let max = errors.last().copied().unwrap_or(0.0);
    let p95_idx = (count as f64 * 0.95) as usize;
    let p95 = errors.get(p95_idx).copied().unwrap_or(max);

    ErrorStats {
        mean,
        max,
        p95,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_buffers() {
        let a = [0.1, 0.5, 0.9];
        let stats = compare_outputs(&a, &a);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.count, 3);
        assert!(stats.is_exact_16bit());
    }

    #[test]
    fn test_one_code_value() {
        let stats = compare_outputs(&[0.0, 0.0], &[0.0, 2.0 / 255.0]);
        assert!(!stats.is_exact_8bit());
        assert!((stats.mean - 1.0 / 255.0).abs() < 1e-12);
    }
}
