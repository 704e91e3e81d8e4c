use serde::Serialize;

use marker_servo_control::{
    CommandGateway, DispatchOutcome, LinkError, VehicleLink, VelocityCommand,
    VisualServoController,
};
use marker_servo_core::{CameraModelError, Frame, MarkerDetector};
use marker_servo_pose::{PlanarPoseEstimator, PoseError};

use crate::annotate::annotate_frame;
use crate::config::{build_detector, DetectorBuildError, PipelineConfig};
use crate::sink::{FrameSink, SinkError};
use crate::target::select_target;

/// Errors surfaced by pipeline construction or a single frame run.
///
/// Per-frame errors abort only that frame's dispatch/annotation; the servo
/// controller is never left half-updated by a failed frame.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Camera(#[from] CameraModelError),

    #[error(transparent)]
    DetectorBuild(#[from] DetectorBuildError),

    #[error(transparent)]
    Pose(#[from] PoseError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Summary of the selected target and the command derived from it.
#[derive(Clone, Debug, Serialize)]
pub struct TargetSummary {
    pub id: u32,
    pub depth: f64,
    /// Angular offsets (horizontal, vertical) in radians.
    pub angles: (f64, f64),
    pub command: VelocityCommand,
}

/// What one frame run did.
#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub markers_detected: usize,
    pub poses_estimated: usize,
    pub target: Option<TargetSummary>,
    /// `None` when the frame was idle (no target selected).
    pub dispatch: Option<DispatchOutcome>,
}

/// The per-frame orchestrator.
///
/// Collaborators are injected at construction; the pipeline owns them for
/// its lifetime. The transport drives it by calling
/// [`FramePipeline::process_frame`] once per arriving frame and must not
/// overlap calls.
pub struct FramePipeline<L: VehicleLink, S: FrameSink> {
    detector: Box<dyn MarkerDetector>,
    estimator: PlanarPoseEstimator,
    servo: VisualServoController,
    gateway: CommandGateway<L>,
    sink: S,
}

impl<L: VehicleLink, S: FrameSink> FramePipeline<L, S> {
    /// Wire a pipeline from configuration plus the two external
    /// collaborators. Configuration problems (unsupported family, unknown
    /// dictionary, degenerate intrinsics) fail here and prevent startup.
    pub fn from_config(config: &PipelineConfig, link: L, sink: S) -> Result<Self, PipelineError> {
        config.camera.validate()?;
        let detector = build_detector(&config.family, config.detector.clone())?;
        let estimator = PlanarPoseEstimator::new(config.marker_size, config.camera.clone())?;
        Ok(Self::new(
            detector,
            estimator,
            VisualServoController::new(&config.servo),
            link,
            sink,
        ))
    }

    pub fn new(
        detector: Box<dyn MarkerDetector>,
        estimator: PlanarPoseEstimator,
        servo: VisualServoController,
        link: L,
        sink: S,
    ) -> Self {
        Self {
            detector,
            estimator,
            servo,
            gateway: CommandGateway::new(link),
            sink,
        }
    }

    /// Run the full sequence for one frame.
    ///
    /// Zero detections and per-marker pose failures are normal operation:
    /// the frame goes idle, the controller keeps its state, and the
    /// (unannotated) copy is still published. Transport errors come back as
    /// `Err` but leave the pipeline ready for the next frame.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, PipelineError> {
        let gray = frame.to_luma();
        let markers = self.detector.detect(&gray.view());
        let markers_detected = markers.len();

        let mut posed = Vec::with_capacity(markers.len());
        for marker in markers {
            match self.estimator.estimate(&marker.corners) {
                Ok(pose) => posed.push((marker, pose)),
                Err(err) => {
                    log::warn!("pose estimation failed for marker {}: {err}", marker.id);
                }
            }
        }
        let poses_estimated = posed.len();

        let target = select_target(posed, self.estimator.camera());

        let mut dispatch = None;
        let mut summary = None;
        let mut link_error = None;
        if let Some(t) = &target {
            let command =
                self.servo
                    .evaluate(t.centroid, (frame.width, frame.height), frame.timestamp);
            match self.gateway.dispatch(&command) {
                Ok(outcome) => dispatch = Some(outcome),
                Err(err) => {
                    log::warn!("command dispatch failed: {err}");
                    link_error = Some(err);
                }
            }
            summary = Some(TargetSummary {
                id: t.marker.id,
                depth: t.depth,
                angles: (t.angles.x, t.angles.y),
                command,
            });
        }

        let annotated = annotate_frame(frame, target.as_ref());
        self.sink.publish(annotated)?;

        if let Some(err) = link_error {
            return Err(err.into());
        }

        Ok(FrameReport {
            markers_detected,
            poses_estimated,
            target: summary,
            dispatch,
        })
    }

    /// Explicitly clear the servo controllers (e.g. after a mode change).
    pub fn reset_controllers(&mut self) {
        self.servo.reset();
    }

    #[inline]
    pub fn servo(&self) -> &VisualServoController {
        &self.servo
    }

    #[inline]
    pub fn link(&self) -> &L {
        self.gateway.link()
    }

    #[inline]
    pub fn link_mut(&mut self) -> &mut L {
        self.gateway.link_mut()
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
