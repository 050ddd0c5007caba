//! # lut-tests
//!
//! Property and scenario tests for oxlut.
//!
//! This crate provides:
//! - Seeded random tables, curves and sample points
//! - Error statistics for comparing interpolated output against a reference
//!
//! ## Test Categories
//!
//! 1. **Curves**: forward/backward agreement of sampled curves
//! 2. **Interpolation**: vertex reproduction, method agreement, weight sums
//! 3. **Traversal**: Hilbert walk coverage and wrap signalling
//! 4. **Population**: builder scenarios, clipping and atomicity

pub mod accuracy;
pub mod patterns;

pub use accuracy::{ErrorStats, compare_outputs};
pub use patterns::{TestPattern, monotonic_curve, random_lut, sample_points};

/// Seeds swept by the randomized tests
pub const SEEDS: [u64; 8] = [1, 2, 3, 5, 8, 13, 21, 42];
