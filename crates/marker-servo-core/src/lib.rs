//! Core types for the marker-servo pipeline.
//!
//! This crate is intentionally small and free of any concrete detector or
//! transport dependency: frames and grayscale views, the camera model, the
//! geometry helpers shared by detection and pose recovery, and the
//! `MarkerDetector` trait the pipeline is polymorphic over.

mod camera;
mod frame;
mod homography;
mod image;
mod logger;
mod marker;

pub use camera::{CameraModel, CameraModelError};
pub use frame::{Frame, FrameError};
pub use homography::{homography_from_4pt, warp_quad_to_square, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView};
pub use marker::{corner_centroid, DetectedMarker, MarkerDetector};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
