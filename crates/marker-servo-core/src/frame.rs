use std::time::Instant;

use crate::image::GrayImage;

/// Errors raised when constructing a [`Frame`] from a raw buffer.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("invalid RGB buffer length (expected {expected} bytes, got {got})")]
    InvalidBufferLength { expected: usize, got: usize },

    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },
}

/// One decoded video frame: packed RGB8, row-major, plus its arrival time.
///
/// Frames are consumed read-only by the pipeline; annotation happens on a
/// clone. The timestamp is captured when the transport hands the frame over
/// and drives the controller's `dt`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a packed RGB8 buffer. The buffer must hold exactly
    /// `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp: Instant) -> Result<Self, FrameError> {
        let w = width as usize;
        let h = height as usize;
        let expected = w
            .checked_mul(h)
            .and_then(|n| n.checked_mul(3))
            .ok_or(FrameError::InvalidDimensions { width, height })?;
        if expected == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        if data.len() != expected {
            return Err(FrameError::InvalidBufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            timestamp,
            data,
        })
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Write one pixel, ignoring out-of-bounds coordinates.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Convert to single-channel luma with Rec.601 weights.
    pub fn to_luma(&self) -> GrayImage {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut out = Vec::with_capacity(w * h);
        for px in self.data.chunks_exact(3) {
            let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            out.push(y.round().clamp(0.0, 255.0) as u8);
        }
        GrayImage {
            width: w,
            height: h,
            data: out,
        }
    }
}
