use std::time::{Duration, Instant};

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::command::VelocityCommand;
use crate::pid::{AxisController, PidGains};

/// Visual servoing configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServoParams {
    /// Gains for the horizontal image axis.
    pub lateral: PidGains,
    /// Gains for the vertical image axis.
    pub longitudinal: PidGains,
    /// Fixed validity window attached to every command.
    pub command_duration: Duration,
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            lateral: PidGains::new(0.007, 0.005, 0.005),
            longitudinal: PidGains::new(0.007, 0.005, 0.005),
            command_duration: Duration::from_millis(500),
        }
    }
}

/// Converts the target's pixel offset into body-frame velocity commands.
///
/// The error signal is the vector from the frame center to the target
/// centroid, in pixels (distinct from the angular offsets carried on the
/// target for other consumers). Axis mapping is a fixed sign/axis-swap for a
/// rigidly mounted camera on a forward/right/down body frame: the vertical
/// image error drives (negated) forward velocity, the horizontal image error
/// drives rightward velocity. Altitude is not commanded here.
#[derive(Clone, Debug)]
pub struct VisualServoController {
    lateral: AxisController,
    longitudinal: AxisController,
    command_duration: Duration,
}

impl VisualServoController {
    pub fn new(params: &ServoParams) -> Self {
        Self {
            lateral: AxisController::new(params.lateral),
            longitudinal: AxisController::new(params.longitudinal),
            command_duration: params.command_duration,
        }
    }

    /// Run both axis controllers against the current target centroid.
    pub fn evaluate(
        &mut self,
        centroid: Point2<f32>,
        frame_size: (u32, u32),
        now: Instant,
    ) -> VelocityCommand {
        let err_x = centroid.x as f64 - frame_size.0 as f64 * 0.5;
        let err_y = centroid.y as f64 - frame_size.1 as f64 * 0.5;

        let u_lat = self.lateral.update(err_x, now);
        let u_lon = self.longitudinal.update(err_y, now);

        VelocityCommand {
            vx: -u_lon,
            vy: u_lat,
            vz: 0.0,
            duration: self.command_duration,
        }
    }

    /// Explicit full reset, for callers that clear state on mode changes.
    pub fn reset(&mut self) {
        self.lateral.reset();
        self.longitudinal.reset();
    }

    #[inline]
    pub fn lateral(&self) -> &AxisController {
        &self.lateral
    }

    #[inline]
    pub fn longitudinal(&self) -> &AxisController {
        &self.longitudinal
    }
}
