//! Per-frame orchestration.
//!
//! One [`FramePipeline`] owns the detector, pose estimator, servo controller
//! and command gateway, and runs the full sequence for every frame pushed by
//! the transport: detect -> estimate -> select -> control -> dispatch ->
//! annotate -> publish. Exactly one frame is in flight at a time; the only
//! state that survives between frames lives in the servo controller.

mod annotate;
mod config;
mod pipeline;
mod sink;
mod target;

pub use annotate::annotate_frame;
pub use config::{build_detector, DetectorBuildError, MarkerFamily, PipelineConfig};
pub use pipeline::{FramePipeline, FrameReport, PipelineError, TargetSummary};
pub use sink::{FrameSink, SinkError};
pub use target::{select_target, Target};
