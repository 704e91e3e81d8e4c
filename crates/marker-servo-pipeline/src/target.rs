use nalgebra::{Point2, Vector2};

use marker_servo_core::{CameraModel, DetectedMarker};
use marker_servo_pose::MarkerPose;

/// The selected approach target for one frame.
///
/// Recomputed fresh on every frame, never cached across frames.
#[derive(Clone, Debug)]
pub struct Target {
    pub marker: DetectedMarker,
    pub pose: MarkerPose,
    /// Translation along the optical axis, in marker-size units.
    pub depth: f64,
    /// Mean of the 4 corner pixels.
    pub centroid: Point2<f32>,
    /// Angular offset of the centroid from the optical axis (small-angle
    /// approximation), radians per axis.
    pub angles: Vector2<f64>,
}

/// Pick the nearest marker along the optical axis.
///
/// Strict `<` comparison makes the first-encountered marker win exact depth
/// ties, so selection is deterministic for a given input order. An empty
/// input yields `None`.
pub fn select_target(
    candidates: Vec<(DetectedMarker, MarkerPose)>,
    camera: &CameraModel,
) -> Option<Target> {
    let mut best: Option<(DetectedMarker, MarkerPose)> = None;
    for (marker, pose) in candidates {
        let closer = match &best {
            Some((_, b)) => pose.depth() < b.depth(),
            None => true,
        };
        if closer {
            best = Some((marker, pose));
        }
    }

    best.map(|(marker, pose)| {
        let centroid = marker.centroid();
        Target {
            depth: pose.depth(),
            angles: camera.pixel_to_angle(centroid),
            centroid,
            marker,
            pose,
        }
    })
}
