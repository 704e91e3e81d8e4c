use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Proportional/integral/derivative gains for one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Lower bound on `dt` so back-to-back evaluations with identical timestamps
/// cannot divide by zero.
pub const MIN_DT: Duration = Duration::from_millis(1);

/// One persistent PID axis.
///
/// State survives across frames for the lifetime of the pipeline; frames
/// without a target leave it untouched, and nothing resets it implicitly.
/// [`AxisController::reset`] exists for explicit use on mode changes.
#[derive(Clone, Debug)]
pub struct AxisController {
    gains: PidGains,
    integral: f64,
    last_error: Option<f64>,
    last_update: Option<Instant>,
}

impl AxisController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            last_error: None,
            last_update: None,
        }
    }

    #[inline]
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Accumulated integral term, exposed for diagnostics.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Advance the controller by one error sample.
    ///
    /// The first sample after construction (or reset) contributes only the
    /// proportional term: without a previous timestamp there is no `dt` to
    /// integrate over and no previous error to differentiate against.
    pub fn update(&mut self, error: f64, now: Instant) -> f64 {
        let output = match (self.last_update, self.last_error) {
            (Some(prev_t), Some(prev_e)) => {
                let dt = now.saturating_duration_since(prev_t).max(MIN_DT).as_secs_f64();
                self.integral += error * dt;
                let derivative = (error - prev_e) / dt;
                self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative
            }
            _ => self.gains.kp * error,
        };

        self.last_error = Some(error);
        self.last_update = Some(now);
        output
    }

    /// Drop integral and derivative memory.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
        self.last_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gains() -> PidGains {
        PidGains::new(0.007, 0.005, 0.005)
    }

    #[test]
    fn first_update_is_proportional_only() {
        let mut axis = AxisController::new(gains());
        let out = axis.update(-150.0, Instant::now());
        assert_relative_eq!(out, 0.007 * -150.0, epsilon = 1e-12);
        assert_relative_eq!(axis.integral(), 0.0);
    }

    #[test]
    fn zero_error_keeps_output_and_integral_at_zero() {
        let mut axis = AxisController::new(gains());
        let t0 = Instant::now();
        for i in 0..20 {
            let out = axis.update(0.0, t0 + Duration::from_secs(i * 7));
            assert_eq!(out, 0.0);
        }
        assert_eq!(axis.integral(), 0.0);
    }

    #[test]
    fn integral_accumulates_error_over_time() {
        let mut axis = AxisController::new(PidGains::new(0.0, 1.0, 0.0));
        let t0 = Instant::now();
        axis.update(2.0, t0);
        let out = axis.update(2.0, t0 + Duration::from_millis(500));
        // one 0.5 s interval at error 2.0
        assert_relative_eq!(axis.integral(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(out, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn derivative_tracks_error_slope() {
        let mut axis = AxisController::new(PidGains::new(0.0, 0.0, 1.0));
        let t0 = Instant::now();
        axis.update(0.0, t0);
        let out = axis.update(1.0, t0 + Duration::from_millis(100));
        assert_relative_eq!(out, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn identical_timestamps_clamp_dt() {
        let mut axis = AxisController::new(PidGains::new(0.0, 0.0, 1.0));
        let t0 = Instant::now();
        axis.update(0.0, t0);
        let out = axis.update(1.0, t0);
        assert!(out.is_finite());
        // derivative over the clamped 1 ms floor
        assert_relative_eq!(out, 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn reset_clears_all_memory() {
        let mut axis = AxisController::new(gains());
        let t0 = Instant::now();
        axis.update(5.0, t0);
        axis.update(5.0, t0 + Duration::from_secs(1));
        assert!(axis.integral() != 0.0);

        axis.reset();
        assert_eq!(axis.integral(), 0.0);
        let out = axis.update(-150.0, t0 + Duration::from_secs(2));
        assert_relative_eq!(out, 0.007 * -150.0, epsilon = 1e-12);
    }
}
