use serde::{Deserialize, Serialize};

use crate::command::VelocityCommand;

/// Flight mode as reported by the vehicle link.
///
/// Only [`VehicleMode::Guided`] accepts external velocity setpoints; the
/// remaining variants exist so mode changes by a supervising pilot are
/// representable without stringly-typed comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleMode {
    Guided,
    Stabilize,
    Loiter,
    Land,
    Rtl,
    Auto,
    Other,
}

impl VehicleMode {
    #[inline]
    pub fn is_guided(&self) -> bool {
        matches!(self, VehicleMode::Guided)
    }
}

/// Errors surfaced by a vehicle link transport.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("vehicle link send failed: {0}")]
    SendFailed(String),
}

/// The external vehicle connection.
///
/// `send_velocity` is fire-and-forget: implementations must not block frame
/// processing waiting for an acknowledgment.
pub trait VehicleLink {
    /// Current flight mode, polled once per frame.
    fn mode(&self) -> VehicleMode;

    /// Send one velocity setpoint, best effort.
    fn send_velocity(&mut self, command: &VelocityCommand) -> Result<(), LinkError>;
}
