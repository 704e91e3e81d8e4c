use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::image::GrayImageView;

/// One detected fiducial marker.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left in the
/// marker's own orientation, in pixel coordinates of the source frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    pub id: u32,
    pub corners: [Point2<f32>; 4],
}

impl DetectedMarker {
    /// Arithmetic mean of the 4 corner positions.
    pub fn centroid(&self) -> Point2<f32> {
        corner_centroid(&self.corners)
    }
}

/// Arithmetic mean of a corner set.
pub fn corner_centroid(corners: &[Point2<f32>; 4]) -> Point2<f32> {
    let mut x = 0.0;
    let mut y = 0.0;
    for c in corners {
        x += c.x;
        y += c.y;
    }
    Point2::new(x * 0.25, y * 0.25)
}

/// A marker detection capability.
///
/// Implementations are built once per session for a concrete marker family;
/// a frame with no markers yields an empty vector, never an error.
pub trait MarkerDetector {
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<DetectedMarker>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_is_mean_of_corners() {
        let m = DetectedMarker {
            id: 7,
            corners: [
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
        };
        assert_eq!(m.centroid(), Point2::new(5.0, 5.0));
    }
}
