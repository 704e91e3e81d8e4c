//! Interop with the `image` crate.

use std::time::Instant;

use marker_servo_core::{Frame, FrameError, GrayImage};

/// Wrap a decoded `image::RgbImage` as a pipeline [`Frame`], stamping the
/// given arrival time.
pub fn frame_from_rgb(img: &::image::RgbImage, timestamp: Instant) -> Result<Frame, FrameError> {
    Frame::new(img.width(), img.height(), img.as_raw().clone(), timestamp)
}

/// Convert a [`Frame`] back into an `image::RgbImage` (e.g. to encode the
/// annotated output).
pub fn frame_to_rgb(frame: &Frame) -> Option<::image::RgbImage> {
    ::image::RgbImage::from_raw(frame.width, frame.height, frame.data().to_vec())
}

/// Expand a single-channel image into an RGB [`Frame`].
pub fn frame_from_gray(gray: &GrayImage, timestamp: Instant) -> Result<Frame, FrameError> {
    let mut rgb = Vec::with_capacity(gray.data.len() * 3);
    for &v in &gray.data {
        rgb.extend_from_slice(&[v, v, v]);
    }
    Frame::new(gray.width as u32, gray.height as u32, rgb, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_round_trip_preserves_pixels() {
        let img = ::image::RgbImage::from_fn(4, 2, |x, y| {
            ::image::Rgb([x as u8, y as u8, (x + y) as u8])
        });
        let frame = frame_from_rgb(&img, Instant::now()).unwrap();
        let back = frame_to_rgb(&frame).unwrap();
        assert_eq!(img.as_raw(), back.as_raw());
    }

    #[test]
    fn gray_expansion_replicates_channels() {
        let gray = GrayImage {
            width: 2,
            height: 1,
            data: vec![7, 200],
        };
        let frame = frame_from_gray(&gray, Instant::now()).unwrap();
        assert_eq!(frame.data(), &[7, 7, 7, 200, 200, 200]);
    }
}
