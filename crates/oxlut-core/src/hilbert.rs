//! Pseudo-Hilbert traversal of a multi-dimensional grid
//!
//! A running counter is Gray coded and its bits are dealt out over the axes
//! one bit-plane at a time, alternating the axis order per plane. Undoing
//! the Gray code per axis gives coordinates where consecutive outputs are
//! close together, which keeps callbacks that cache per-region state warm.
//! This is not an exact Hilbert curve.
//!
//! Axes need not have power of two resolutions; counter values that decode
//! outside the grid are skipped.

use crate::error::{LutError, Result};

/// Largest total bit count the counter may use
const MAX_BITS: u32 = 63;

/// Generator of grid coordinates in pseudo-Hilbert order
#[derive(Debug, Clone)]
pub struct HilbertSequencer {
    resolution: Vec<usize>,
    bits: Vec<u32>,
    max_bits: u32,
    mask: u64,
    counter: u64,
    coords: Vec<usize>,
}

impl HilbertSequencer {
    /// Sequencer over a grid with a resolution per axis
    pub fn new(resolution: &[usize]) -> Result<Self> {
        if resolution.is_empty() || resolution.len() > crate::MAX_CHANNELS {
            return Err(LutError::UnsupportedChannelCount(resolution.len()));
        }

        let mut bits = Vec::with_capacity(resolution.len());
        for &res in resolution {
            if res == 0 {
                return Err(LutError::InvalidResolution(res));
            }
            // Smallest b with 2^b >= res
            bits.push(usize::BITS - (res - 1).leading_zeros());
        }
        let total: u32 = bits.iter().sum();
        if total > MAX_BITS {
            return Err(LutError::SequencerTooLarge { bits: total });
        }

        Ok(Self {
            resolution: resolution.to_vec(),
            max_bits: bits.iter().copied().max().unwrap_or(0),
            bits,
            mask: (1u64 << total) - 1,
            counter: 0,
            coords: vec![0; resolution.len()],
        })
    }

    /// Sequencer over `dims` axes that all have `resolution` points
    pub fn uniform(dims: usize, resolution: usize) -> Result<Self> {
        Self::new(&vec![resolution; dims])
    }

    pub fn dims(&self) -> usize {
        self.resolution.len()
    }

    /// Number of coordinates in one full period
    pub fn count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Current coordinate
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// Return to the origin
    pub fn reset(&mut self) {
        self.counter = 0;
        self.coords.fill(0);
    }

    /// Step to the next coordinate. Returns true when the walk wrapped back
    /// to the origin.
    pub fn advance(&mut self) -> bool {
        loop {
            self.counter = (self.counter + 1) & self.mask;
            let mut gray = self.counter ^ (self.counter >> 1);

            let mut decoded = [0u64; crate::MAX_CHANNELS];
            let decoded = &mut decoded[..self.dims()];
            for b in 0..self.max_bits {
                let mut deal = |e: usize| {
                    if b < self.bits[e] {
                        decoded[e] |= (gray & 1) << b;
                        gray >>= 1;
                    }
                };
                if b % 2 == 1 {
                    (0..self.resolution.len()).rev().for_each(&mut deal);
                } else {
                    (0..self.resolution.len()).for_each(&mut deal);
                }
            }

            for tv in decoded.iter_mut() {
                *tv = gray_decode(*tv);
            }

            if decoded
                .iter()
                .zip(&self.resolution)
                .all(|(&v, &res)| (v as usize) < res)
            {
                for (c, &v) in self.coords.iter_mut().zip(decoded.iter()) {
                    *c = v as usize;
                }
                return self.counter == 0;
            }
        }
    }

    /// Iterate one full period starting at the origin
    pub fn walk(&self) -> Walk {
        let mut seq = self.clone();
        seq.reset();
        Walk {
            remaining: seq.count(),
            seq,
            started: false,
        }
    }
}

/// Undo a Gray code by folding with doubling shifts
#[inline]
fn gray_decode(mut tv: u64) -> u64 {
    let mut sh = 1;
    loop {
        let ptv = tv;
        tv ^= tv >> sh;
        if ptv <= 1 || sh == 32 {
            return tv;
        }
        sh <<= 1;
    }
}

/// Iterator over one period of a [`HilbertSequencer`]
#[derive(Debug, Clone)]
pub struct Walk {
    seq: HilbertSequencer,
    remaining: usize,
    started: bool,
}

impl Iterator for Walk {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.started {
            self.seq.advance();
        }
        self.started = true;
        self.remaining -= 1;
        Some(self.seq.coords().to_vec())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Walk {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_gray_decode() {
        for v in 0u64..1024 {
            assert_eq!(gray_decode(v ^ (v >> 1)), v);
        }
        let big = 0x7FFF_FFFF_FFFF_FFFFu64;
        assert_eq!(gray_decode(big ^ (big >> 1)), big);
    }

    #[test]
    fn test_power_of_two_coverage() {
        let mut seq = HilbertSequencer::uniform(3, 4).unwrap();
        let mut seen = HashSet::new();
        for i in 0..64 {
            let wrapped = seq.advance();
            assert_eq!(wrapped, i == 63);
            assert!(seen.insert(seq.coords().to_vec()));
        }
        assert_eq!(seen.len(), 64);
        assert_eq!(seq.coords(), &[0, 0, 0]);
    }

    #[test]
    fn test_odd_resolution_coverage() {
        let seq = HilbertSequencer::new(&[3, 5]).unwrap();
        let visited: HashSet<_> = seq.walk().collect();
        assert_eq!(visited.len(), 15);
        assert!(visited.iter().all(|c| c[0] < 3 && c[1] < 5));
    }

    #[test]
    fn test_walk_starts_at_origin() {
        let seq = HilbertSequencer::uniform(2, 3).unwrap();
        let mut walk = seq.walk();
        assert_eq!(walk.len(), 9);
        assert_eq!(walk.next(), Some(vec![0, 0]));
    }

    #[test]
    fn test_one_axis_per_step() {
        // Power of two grids never skip, so each step flips one Gray bit
        let seq = HilbertSequencer::uniform(2, 8).unwrap();
        let path: Vec<_> = seq.walk().collect();
        for pair in path.windows(2) {
            let changed = pair[0].iter().zip(&pair[1]).filter(|(a, b)| a != b).count();
            assert_eq!(changed, 1);
        }
    }

    #[test]
    fn test_single_point_axes() {
        let mut seq = HilbertSequencer::new(&[1, 1]).unwrap();
        assert_eq!(seq.count(), 1);
        assert!(seq.advance());
        assert_eq!(seq.coords(), &[0, 0]);
    }

    #[test]
    fn test_too_many_bits() {
        assert_eq!(
            HilbertSequencer::uniform(8, 256).unwrap_err(),
            LutError::SequencerTooLarge { bits: 64 }
        );
        assert!(HilbertSequencer::new(&[]).is_err());
        assert!(HilbertSequencer::new(&[4, 0]).is_err());
    }
}
