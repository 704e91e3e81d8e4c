//! Square-fiducial marker detection.
//!
//! The crate covers the full path from a grayscale frame to identified
//! markers:
//! - embedded built-in dictionaries with packed `u64` codes,
//! - rotation-invariant matching of observed codes,
//! - quad candidate extraction (adaptive threshold, border following,
//!   polygon simplification),
//! - per-quad unwarping and bit decoding.
//!
//! [`SquareFiducialDetector`] ties these together behind the
//! `marker_servo_core::MarkerDetector` trait.

pub mod builtins;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod quad;
pub mod render;
mod threshold;

pub use decode::{decode_quad, DecodeParams, DecodedQuad};
pub use detector::{SquareFiducialDetector, SquareFiducialParams};
pub use dictionary::Dictionary;
pub use matcher::{rotate_code_u64, CodeMatch, Matcher};
pub use quad::{find_quad_candidates, QuadParams};
