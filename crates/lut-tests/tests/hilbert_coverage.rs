//! Hilbert sequencer coverage
//!
//! One full period must visit every coordinate of the grid exactly once
//! and signal the wrap on its final step.

use std::collections::HashSet;

use oxlut_core::{HilbertSequencer, LutError};
use rayon::prelude::*;

fn assert_full_period(resolution: &[usize]) {
    let mut seq = HilbertSequencer::new(resolution).unwrap();
    let total: usize = resolution.iter().product();
    assert_eq!(seq.count(), total);

    let mut seen = HashSet::with_capacity(total);
    for step in 1..=total {
        let wrapped = seq.advance();
        assert_eq!(wrapped, step == total, "{resolution:?} step {step}");
        let coords = seq.coords();
        assert!(
            coords.iter().zip(resolution).all(|(&c, &r)| c < r),
            "{resolution:?} out of range {coords:?}"
        );
        assert!(seen.insert(coords.to_vec()), "{resolution:?} repeated {coords:?}");
    }
    assert_eq!(seen.len(), total);
    assert!(seq.coords().iter().all(|&c| c == 0));
}

#[test]
fn uniform_grids_visit_every_coordinate_once() {
    let cases: Vec<(usize, usize)> = (1..=4)
        .flat_map(|dims| (2..=9).map(move |res| (dims, res)))
        .chain([(5, 5), (6, 3), (8, 2), (3, 17), (3, 33)])
        .collect();
    cases.par_iter().for_each(|&(dims, res)| {
        assert_full_period(&vec![res; dims]);
    });
}

#[test]
fn mixed_resolutions_visit_every_coordinate_once() {
    for resolution in [vec![2, 5], vec![7, 3, 4], vec![1, 6], vec![3, 1, 2, 5]] {
        assert_full_period(&resolution);
    }
}

#[test]
fn second_period_repeats_the_first() {
    let mut seq = HilbertSequencer::uniform(3, 5).unwrap();
    let first: Vec<Vec<usize>> = (0..125)
        .map(|_| {
            seq.advance();
            seq.coords().to_vec()
        })
        .collect();
    let second: Vec<Vec<usize>> = (0..125)
        .map(|_| {
            seq.advance();
            seq.coords().to_vec()
        })
        .collect();
    assert_eq!(first, second);
}

#[test]
fn walk_matches_advance() {
    let mut seq = HilbertSequencer::new(&[3, 6]).unwrap();
    let walked: Vec<Vec<usize>> = seq.walk().collect();
    assert_eq!(walked.len(), 18);
    assert_eq!(walked[0], vec![0, 0]);
    for expected in &walked[1..] {
        assert!(!seq.advance());
        assert_eq!(seq.coords(), expected.as_slice());
    }
    assert!(seq.advance());
}

#[test]
fn reset_returns_to_origin() {
    let mut seq = HilbertSequencer::uniform(2, 4).unwrap();
    let first_step = {
        seq.advance();
        seq.coords().to_vec()
    };
    for _ in 0..5 {
        seq.advance();
    }
    seq.reset();
    assert_eq!(seq.coords(), &[0, 0]);
    seq.advance();
    assert_eq!(seq.coords(), first_step.as_slice());
}

#[test]
fn oversized_grids_rejected() {
    assert!(matches!(
        HilbertSequencer::uniform(15, 33),
        Err(LutError::SequencerTooLarge { bits: 90 })
    ));
    assert!(HilbertSequencer::uniform(15, 16).is_ok());
}
