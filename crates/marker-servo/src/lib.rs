//! High-level facade crate for the `marker-servo-*` workspace.
//!
//! A vision-guided precision-approach stack: detect a square fiducial marker
//! in a video frame, recover its 3D pose, select the nearest target, and
//! null its image-plane offset with a PID visual-servoing loop whose
//! commands are gated on the vehicle's guided mode.
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_servo::pipeline::{FramePipeline, PipelineConfig};
//! use marker_servo::control::{LinkError, VehicleLink, VehicleMode, VelocityCommand};
//! use marker_servo::pipeline::{FrameSink, SinkError};
//! use marker_servo::core::Frame;
//!
//! struct Mavlink; // your vehicle connection
//! impl VehicleLink for Mavlink {
//!     fn mode(&self) -> VehicleMode { VehicleMode::Guided }
//!     fn send_velocity(&mut self, _: &VelocityCommand) -> Result<(), LinkError> { Ok(()) }
//! }
//!
//! struct Display; // your annotated-frame consumer
//! impl FrameSink for Display {
//!     fn publish(&mut self, _: Frame) -> Result<(), SinkError> { Ok(()) }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let mut pipeline = FramePipeline::from_config(&config, Mavlink, Display)?;
//! // for each frame arriving from the camera transport:
//! // let report = pipeline.process_frame(&frame)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marker_servo::core`: frames, camera model, geometry, detector trait.
//! - `marker_servo::aruco`: square-fiducial dictionaries and detection.
//! - `marker_servo::pose`: planar square pose recovery.
//! - `marker_servo::control`: PID axes, servo controller, command gateway.
//! - `marker_servo::pipeline`: per-frame orchestration and configuration.
//! - `marker_servo::convert` (feature `image`): `image` crate interop.

pub use marker_servo_aruco as aruco;
pub use marker_servo_control as control;
pub use marker_servo_core as core;
pub use marker_servo_pipeline as pipeline;
pub use marker_servo_pose as pose;

pub use marker_servo_control::{VehicleLink, VehicleMode, VelocityCommand};
pub use marker_servo_core::{CameraModel, DetectedMarker, Frame, MarkerDetector};
pub use marker_servo_pipeline::{FramePipeline, FrameSink, PipelineConfig};
pub use marker_servo_pose::MarkerPose;

#[cfg(feature = "image")]
pub mod convert;
