use nalgebra::{Point2, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use marker_servo_core::{CameraModel, CameraModelError};

use crate::solve::{orthogonal_iteration, pose_from_homography, second_minimum, Candidate};

/// Errors from planar pose recovery.
#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    #[error(transparent)]
    Camera(#[from] CameraModelError),

    #[error("marker size must be positive, got {0}")]
    InvalidMarkerSize(f64),

    #[error("degenerate marker corners")]
    DegenerateCorners,
}

/// One pose solution: axis-angle rotation, translation, object-space error.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PoseSolution {
    pub rvec: Vector3<f64>,
    pub tvec: Vector3<f64>,
    pub error: f64,
}

/// Recovered marker pose relative to the camera.
///
/// Translation is expressed in the units of the configured marker size;
/// `depth()` is the component along the optical axis. The ambiguous second
/// solution is retained for diagnostics when one exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerPose {
    pub rvec: Vector3<f64>,
    pub tvec: Vector3<f64>,
    pub error: f64,
    pub alternate: Option<PoseSolution>,
}

impl MarkerPose {
    #[inline]
    pub fn depth(&self) -> f64 {
        self.tvec.z
    }
}

/// Pose estimator for a planar square marker of known physical size.
///
/// The marker model is a square centered at the origin on the z = 0 plane,
/// corners `(-s/2, +s/2), (+s/2, +s/2), (+s/2, -s/2), (-s/2, -s/2)` in the
/// detector's corner order (TL, TR, BR, BL).
#[derive(Clone, Debug)]
pub struct PlanarPoseEstimator {
    marker_size: f64,
    camera: CameraModel,
    model2: [Point2<f64>; 4],
    model3: [Vector3<f64>; 4],
}

const REFINE_ITERATIONS: usize = 50;

impl PlanarPoseEstimator {
    pub fn new(marker_size: f64, camera: CameraModel) -> Result<Self, PoseError> {
        camera.validate()?;
        if !(marker_size.is_finite() && marker_size > 0.0) {
            return Err(PoseError::InvalidMarkerSize(marker_size));
        }

        let h = marker_size * 0.5;
        let model2 = [
            Point2::new(-h, h),
            Point2::new(h, h),
            Point2::new(h, -h),
            Point2::new(-h, -h),
        ];
        let model3 = model2.map(|p| Vector3::new(p.x, p.y, 0.0));

        Ok(Self {
            marker_size,
            camera,
            model2,
            model3,
        })
    }

    #[inline]
    pub fn marker_size(&self) -> f64 {
        self.marker_size
    }

    #[inline]
    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// Recover the marker pose from its 4 ordered image corners.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn estimate(&self, corners: &[Point2<f32>; 4]) -> Result<MarkerPose, PoseError> {
        if corners.iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
            return Err(PoseError::DegenerateCorners);
        }

        let mut rays = [Vector3::zeros(); 4];
        for (ray, c) in rays.iter_mut().zip(corners) {
            let n = self
                .camera
                .undistort_point(Point2::new(c.x as f64, c.y as f64));
            *ray = Vector3::new(n.x, n.y, 1.0);
        }

        let init =
            pose_from_homography(&self.model2, &rays).ok_or(PoseError::DegenerateCorners)?;
        let first = orthogonal_iteration(&rays, &self.model3, &init, REFINE_ITERATIONS)
            .ok_or(PoseError::DegenerateCorners)?;
        let alt = second_minimum(&rays, &self.model3, &first);

        let (best, other) = match alt {
            Some(second) if second.error < first.error => (second, Some(first)),
            other => (first, other),
        };

        Ok(MarkerPose {
            rvec: axis_angle(&best),
            tvec: best.translation,
            error: best.error,
            alternate: other.map(|c| PoseSolution {
                rvec: axis_angle(&c),
                tvec: c.translation,
                error: c.error,
            }),
        })
    }
}

fn axis_angle(candidate: &Candidate) -> Vector3<f64> {
    Rotation3::from_matrix_unchecked(candidate.rotation).scaled_axis()
}
