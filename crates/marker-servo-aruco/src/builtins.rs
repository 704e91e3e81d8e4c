//! Embedded built-in dictionaries.
//!
//! Codes are packed row-major, black = 1, least-significant bit first. The
//! 4x4 table below was generated with a minimum pairwise Hamming distance of
//! 5 across all rotations, so two-bit correction never crosses codewords.

use crate::Dictionary;

const DICT_4X4_16_CODES: [u64; 16] = [
    0x52e1, 0x022b, 0xfb9c, 0xd278, //
    0xc1b4, 0x1634, 0x982e, 0x86d7, //
    0x214c, 0x2ab3, 0xf732, 0xe36e, //
    0xa9f9, 0x1923, 0x7e70, 0x4b80,
];

/// 16 markers, 4x4 inner bits.
pub const DICT_4X4_16: Dictionary = Dictionary {
    name: "DICT_4X4_16",
    marker_size: 4,
    max_correction_bits: 2,
    codes: &DICT_4X4_16_CODES,
};

/// Look up a built-in dictionary by name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    match name {
        "DICT_4X4_16" => Some(DICT_4X4_16),
        _ => None,
    }
}
