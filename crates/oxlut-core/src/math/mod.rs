//! Mathematical operations for lookup tables
//!
//! - 3x3 matrix stage for XYZ input tables
//! - Interpolation kernels for curve and grid evaluation
//! - Checked grid sizing

pub mod interpolation;
pub mod matrix;

pub use interpolation::{corner_weights, lerp, locate, simplex_weights, sort_axes};
pub use matrix::Matrix3x3;

/// Number of grid points in a `resolution ^ dims` grid, or `None` on overflow
#[inline]
pub fn grid_points(resolution: usize, dims: usize) -> Option<usize> {
    let dims = u32::try_from(dims).ok()?;
    resolution.checked_pow(dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_points() {
        assert_eq!(grid_points(33, 3), Some(35937));
        assert_eq!(grid_points(17, 0), Some(1));
        assert_eq!(grid_points(255, 15), None);
    }
}
