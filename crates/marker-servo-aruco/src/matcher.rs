//! Rotation-invariant dictionary matching.

use crate::Dictionary;

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeMatch {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` (quarter turns clockwise) such that
    /// `observed == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance after rotation.
    pub hamming: u8,
}

/// Matcher for a fixed dictionary.
///
/// All four rotations of every codeword are precomputed once; matching is a
/// brute-force popcount sweep, which is plenty for dictionary sizes in the
/// hundreds.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    pub fn new(dict: Dictionary, max_hamming: u8) -> Self {
        debug_assert!(
            dict.bit_count() <= 64,
            "marker_size {} exceeds u64 code storage",
            dict.marker_size
        );

        let rotated = dict
            .codes
            .iter()
            .map(|&base| {
                [
                    base,
                    rotate_code_u64(base, dict.marker_size, 1),
                    rotate_code_u64(base, dict.marker_size, 2),
                    rotate_code_u64(base, dict.marker_size, 3),
                ]
            })
            .collect();

        Self {
            dict,
            max_hamming,
            rotated,
        }
    }

    #[inline]
    pub fn dictionary(&self) -> Dictionary {
        self.dict
    }

    /// Find the best match within the Hamming budget.
    pub fn best_match(&self, observed: u64) -> Option<CodeMatch> {
        let mut best: Option<CodeMatch> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                if best.map_or(true, |prev| h < prev.hamming) {
                    best = Some(CodeMatch {
                        id: id as u32,
                        rotation: rot as u8,
                        hamming: h,
                    });
                    if h == 0 {
                        return best;
                    }
                }
            }
        }

        best
    }
}

/// Rotate a packed code by `rot` quarter turns clockwise.
///
/// Bits are stored row-major, `idx = y * n + x`.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let bit = (code >> (sy * n + sx)) & 1;
            out |= bit << (y * n + x);
        }
    }
    out
}
