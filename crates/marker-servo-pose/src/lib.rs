//! Planar square pose recovery.
//!
//! Recovers the 3D pose of a flat square marker from its 4 image corners.
//! The solver is specific to the planar-square geometry: a homography from
//! the marker plane to the normalized image plane provides the initial
//! rotation and translation, orthogonal iteration refines it, and the
//! reflected second minimum is always constructed and compared so that the
//! well-known flipped-pose ambiguity of near-fronto-parallel squares is
//! resolved by error, not by luck.

mod estimator;
mod solve;

pub use estimator::{MarkerPose, PlanarPoseEstimator, PoseError, PoseSolution};
