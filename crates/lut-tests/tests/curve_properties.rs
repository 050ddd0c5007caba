//! Curve forward/backward properties
//!
//! Sampled curves are inverted through their reverse index. These tests
//! sweep random monotonic curves and check the documented edge cases.

use lut_tests::{SEEDS, TestPattern, monotonic_curve, sample_points};
use oxlut_core::Curve1D;
use rayon::prelude::*;

const EPSILON: f64 = 1e-9;

#[test]
fn three_point_table_scenario() {
    let curve = Curve1D::table(vec![0.0, 0.5, 1.0]);
    let (y, clipped) = curve.lookup_fwd(0.25);
    assert!((y - 0.25).abs() < EPSILON);
    assert!(!clipped);

    let (x, clipped) = curve.lookup_bwd(0.25).unwrap();
    assert!((x - 0.25).abs() < EPSILON);
    assert!(!clipped);
}

#[test]
fn monotonic_tables_invert() {
    SEEDS.par_iter().for_each(|&seed| {
        for entries in [2, 3, 17, 256, 4096] {
            let curve = monotonic_curve(entries, seed);
            let step = 1.0 / (entries - 1) as f64;
            for p in sample_points(TestPattern::Random(seed), 1, entries, 200) {
                let x = p[0];
                let (y, _) = curve.lookup_fwd(x);
                let (back, clipped) = curve.lookup_bwd(y).unwrap();
                assert!(!clipped, "seed {seed} entries {entries} x {x}");
                assert!((back - x).abs() < step, "seed {seed} entries {entries} x {x}");
                assert!((back - x).abs() < EPSILON, "seed {seed} entries {entries} x {x}");
            }
        }
    });
}

#[test]
fn decreasing_tables_invert() {
    let samples: Vec<f64> = (0..65).map(|i| 1.0 - (i as f64 / 64.0).powf(0.8)).collect();
    let curve = Curve1D::table(samples);
    for i in 0..=100 {
        let x = i as f64 / 100.0;
        let (y, _) = curve.lookup_fwd(x);
        let (back, clipped) = curve.lookup_bwd(y).unwrap();
        assert!(!clipped);
        assert!((back - x).abs() < EPSILON);
    }
}

#[test]
fn non_monotonic_first_segment_wins() {
    let curve = Curve1D::table(vec![0.0, 1.0, 0.0]);
    let (x, clipped) = curve.lookup_bwd(0.5).unwrap();
    assert!(!clipped);
    assert!((x - 0.25).abs() < EPSILON);
}

#[test]
fn out_of_range_uses_nearest_sample() {
    let curve = Curve1D::table(vec![0.2, 0.4, 0.6, 0.8]);
    let (x, clipped) = curve.lookup_bwd(0.95).unwrap();
    assert!(clipped);
    assert!((x - 1.0).abs() < EPSILON);

    let (x, clipped) = curve.lookup_bwd(0.0).unwrap();
    assert!(clipped);
    assert!(x.abs() < EPSILON);
}

#[test]
fn forward_clamps_outside_domain() {
    let curve = monotonic_curve(9, 5);
    let (lo, clipped) = curve.lookup_fwd(-0.25);
    assert!(clipped);
    assert_eq!(lo, 0.0);
    let (hi, clipped) = curve.lookup_fwd(1.25);
    assert!(clipped);
    assert!((hi - 1.0).abs() < EPSILON);
}

#[test]
fn gamma_round_trip() {
    for g in [0.45, 1.0, 1.8, 2.4] {
        let curve = Curve1D::Gamma(g);
        for i in 1..=20 {
            let x = i as f64 / 20.0;
            let (y, _) = curve.lookup_fwd(x);
            let (back, _) = curve.lookup_bwd(y).unwrap();
            assert!((back - x).abs() < EPSILON, "gamma {g} x {x}");
        }
    }
}

#[test]
fn rewritten_samples_are_inverted_afresh() {
    let mut curve = Curve1D::identity_table(33).unwrap();
    let (x, _) = curve.lookup_bwd(0.5).unwrap();
    assert!((x - 0.5).abs() < EPSILON);

    // Square the curve in place
    for v in curve.samples_mut().unwrap() {
        *v *= *v;
    }
    let (x, clipped) = curve.lookup_bwd(0.25).unwrap();
    assert!(!clipped);
    assert!((x - 0.5).abs() < EPSILON);
}

#[test]
fn shared_curve_concurrent_backward_lookups() {
    let curve = monotonic_curve(1024, 9);
    assert!(!curve.has_reverse_index());
    let results: Vec<(f64, f64)> = (0..=1000)
        .into_par_iter()
        .map(|i| {
            let x = i as f64 / 1000.0;
            let (y, _) = curve.lookup_fwd(x);
            (x, curve.lookup_bwd(y).unwrap().0)
        })
        .collect();
    assert!(curve.has_reverse_index());
    for (x, back) in results {
        assert!((back - x).abs() < EPSILON);
    }
}

#[test]
fn serialized_tables_are_rebuilt() {
    let empty: Curve1D = serde_json::from_str(r#"{"Table":{"samples":[]}}"#).unwrap();
    assert_eq!(empty.lookup_fwd(0.5), (0.5, false));

    let single: Curve1D = serde_json::from_str(r#"{"Table":{"samples":[0.7]}}"#).unwrap();
    assert_eq!(single.entries(), Some(2));
    assert_eq!(single.lookup_fwd(0.5), (0.7, false));
}
