//! Dictionary metadata and packed marker codes.

/// A fixed square-fiducial dictionary.
#[derive(Clone, Copy, Debug)]
pub struct Dictionary {
    /// Human-readable name (for logging and configuration).
    pub name: &'static str,
    /// Marker side length in inner bits.
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size x marker_size`
    /// bits in row-major order with **black = 1**.
    pub codes: &'static [u64],
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Number of cells per marker side including the black border.
    #[inline]
    pub fn cells_per_side(&self) -> usize {
        self.marker_size + 2
    }
}
