use marker_servo_core::Frame;

/// Errors surfaced by an annotated-frame sink.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("frame publish failed: {0}")]
    PublishFailed(String),
}

/// Destination for annotated frames (display, transport, recorder).
pub trait FrameSink {
    fn publish(&mut self, frame: Frame) -> Result<(), SinkError>;
}
