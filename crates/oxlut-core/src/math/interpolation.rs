//! Interpolation kernels for LUT evaluation
//!
//! This module provides:
//! - Linear interpolation (1D)
//! - Cell location of a normalized coordinate on a grid axis
//! - Multilinear corner weights for an N-dimensional cell
//! - Simplex (Kuhn triangulation) axis ordering and vertex weights

/// Linear interpolation between two values
///
/// Returns a + t * (b - a) for t in [0, 1]
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Locate `x` (normalized `[0, 1]`) on an axis with `points` grid points.
///
/// Returns the base cell index (never above `points - 2`), the fractional
/// offset within the cell and whether `x` had to be clamped.
#[inline]
pub fn locate(x: f64, points: usize) -> (usize, f64, bool) {
    debug_assert!(points >= 2);
    let last = (points - 1) as f64;
    let mut val = x * last;
    let mut clipped = false;
    if val < 0.0 {
        val = 0.0;
        clipped = true;
    } else if val > last {
        val = last;
        clipped = true;
    }
    let base = (val.floor() as usize).min(points - 2);
    (base, val - base as f64, clipped)
}

/// Expand per-axis fractions into `2^D` hypercube corner weights.
///
/// Corner `i` takes the upper grid line along axis `e` when bit `e` of `i`
/// is set. `weights` must hold at least `1 << frac.len()` entries.
pub fn corner_weights(frac: &[f64], weights: &mut [f64]) {
    weights[0] = 1.0;
    let mut g = 1;
    for &co in frac {
        for i in 0..g {
            weights[g + i] = weights[i] * co;
            weights[i] *= 1.0 - co;
        }
        g *= 2;
    }
}

/// Stable insertion sort of axis indices by ascending fraction.
///
/// Equal fractions keep their axis order.
pub fn sort_axes(frac: &[f64], order: &mut [usize]) {
    for (e, slot) in order.iter_mut().enumerate().take(frac.len()) {
        *slot = e;
    }
    for e in 1..frac.len() {
        let v = frac[order[e]];
        let moving = order[e];
        let mut f = e;
        while f > 0 && frac[order[f - 1]] > v {
            order[f] = order[f - 1];
            f -= 1;
        }
        order[f] = moving;
    }
}

/// Simplex vertex weights for fractions sorted by `order` (ascending).
///
/// `weights[0]` belongs to the cell base, `weights[k]` to the vertex reached
/// after stepping along the `k` axes with the largest fractions, so
/// `weights[D]` is the far corner.
pub fn simplex_weights(frac: &[f64], order: &[usize], weights: &mut [f64]) {
    let d = frac.len();
    weights[0] = 1.0 - frac[order[d - 1]];
    for k in 1..d {
        weights[k] = frac[order[d - k]] - frac[order[d - k - 1]];
    }
    weights[d] = frac[order[0]];
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 1.0, 0.5) - 0.5).abs() < EPSILON);
        assert!((lerp(2.0, 4.0, 0.25) - 2.5).abs() < EPSILON);
    }

    #[test]
    fn test_locate() {
        assert_eq!(locate(0.0, 3), (0, 0.0, false));
        assert_eq!(locate(0.5, 3), (1, 0.0, false));
        assert_eq!(locate(1.0, 3), (1, 1.0, false));
        assert_eq!(locate(-0.5, 3), (0, 0.0, true));
        assert_eq!(locate(1.5, 3), (1, 1.0, true));
        let (base, frac, clipped) = locate(0.25, 3);
        assert_eq!(base, 0);
        assert!((frac - 0.5).abs() < EPSILON);
        assert!(!clipped);
    }

    #[test]
    fn test_corner_weights_bilinear() {
        let mut w = [0.0; 4];
        corner_weights(&[0.25, 0.5], &mut w);
        assert!((w[0] - 0.75 * 0.5).abs() < EPSILON);
        assert!((w[1] - 0.25 * 0.5).abs() < EPSILON);
        assert!((w[2] - 0.75 * 0.5).abs() < EPSILON);
        assert!((w[3] - 0.25 * 0.5).abs() < EPSILON);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_sort_axes_stable() {
        let mut order = [0; 4];
        sort_axes(&[0.5, 0.1, 0.5, 0.0], &mut order);
        assert_eq!(order, [3, 1, 0, 2]);
    }

    #[test]
    fn test_simplex_weights() {
        let frac = [0.2, 0.7, 0.5];
        let mut order = [0; 3];
        sort_axes(&frac, &mut order);
        assert_eq!(order, [0, 2, 1]);
        let mut w = [0.0; 4];
        simplex_weights(&frac, &order, &mut w);
        assert!((w[0] - 0.3).abs() < EPSILON);
        assert!((w[1] - 0.2).abs() < EPSILON);
        assert!((w[2] - 0.3).abs() < EPSILON);
        assert!((w[3] - 0.2).abs() < EPSILON);
    }
}
