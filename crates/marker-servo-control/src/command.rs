use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One body-frame velocity setpoint (forward/right/down convention) with a
/// nominal validity window.
///
/// Constructed and dispatched once per frame, never stored or replayed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Forward velocity in m/s.
    pub vx: f64,
    /// Rightward velocity in m/s.
    pub vy: f64,
    /// Downward velocity in m/s.
    pub vz: f64,
    /// Nominal duration of the movement.
    pub duration: Duration,
}
