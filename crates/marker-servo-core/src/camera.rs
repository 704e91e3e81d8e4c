use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Errors raised when validating camera intrinsics.
#[derive(thiserror::Error, Debug)]
pub enum CameraModelError {
    #[error("degenerate camera intrinsics (fx={fx}, fy={fy})")]
    DegenerateIntrinsics { fx: f64, fy: f64 },

    #[error("invalid camera resolution ({width}x{height})")]
    InvalidResolution { width: u32, height: u32 },
}

/// Pinhole camera intrinsics with Brown-Conrady distortion.
///
/// Immutable for the lifetime of a session; every pixel/angle conversion in
/// the pipeline derives from it. Fields are public for serde configuration,
/// `validate` must pass before the model enters the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraModel {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    /// Distortion coefficients `[k1, k2, p1, p2, k3]`.
    #[serde(default)]
    pub distortion: [f64; 5],
    /// Sensor resolution in pixels (horizontal, vertical).
    pub resolution: (u32, u32),
    /// Field of view in radians (horizontal, vertical).
    pub fov: (f64, f64),
}

impl CameraModel {
    pub fn new(
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        distortion: [f64; 5],
        resolution: (u32, u32),
        fov: (f64, f64),
    ) -> Result<Self, CameraModelError> {
        let model = Self {
            fx,
            fy,
            cx,
            cy,
            distortion,
            resolution,
            fov,
        };
        model.validate()?;
        Ok(model)
    }

    /// Reject degenerate intrinsics before the pipeline starts.
    pub fn validate(&self) -> Result<(), CameraModelError> {
        if !(self.fx.is_finite() && self.fy.is_finite()) || self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(CameraModelError::DegenerateIntrinsics {
                fx: self.fx,
                fy: self.fy,
            });
        }
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(CameraModelError::InvalidResolution {
                width: self.resolution.0,
                height: self.resolution.1,
            });
        }
        Ok(())
    }

    /// Geometric center of the frame in pixel coordinates.
    #[inline]
    pub fn frame_center(&self) -> Point2<f32> {
        Point2::new(
            self.resolution.0 as f32 * 0.5,
            self.resolution.1 as f32 * 0.5,
        )
    }

    /// Angular offset of a pixel from the optical axis, in radians.
    ///
    /// Small-angle linear approximation `(p - res/2) * fov / res` per axis,
    /// valid near the optical axis. This is the documented contract, not a
    /// trigonometric projection.
    pub fn pixel_to_angle(&self, p: Point2<f32>) -> Vector2<f64> {
        let (w, h) = (self.resolution.0 as f64, self.resolution.1 as f64);
        Vector2::new(
            (p.x as f64 - w * 0.5) * self.fov.0 / w,
            (p.y as f64 - h * 0.5) * self.fov.1 / h,
        )
    }

    /// Map a pixel to undistorted normalized image coordinates.
    ///
    /// Inverts the Brown-Conrady model iteratively; with zero coefficients
    /// this reduces to `((u - cx)/fx, (v - cy)/fy)`.
    pub fn undistort_point(&self, p: Point2<f64>) -> Point2<f64> {
        let xd = (p.x - self.cx) / self.fx;
        let yd = (p.y - self.cy) / self.fy;

        let [k1, k2, p1, p2, k3] = self.distortion;
        if k1 == 0.0 && k2 == 0.0 && p1 == 0.0 && p2 == 0.0 && k3 == 0.0 {
            return Point2::new(xd, yd);
        }

        let mut x = xd;
        let mut y = yd;
        for _ in 0..5 {
            let r2 = x * x + y * y;
            let radial = 1.0 + r2 * (k1 + r2 * (k2 + r2 * k3));
            let dx = 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
            let dy = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;
            x = (xd - dx) / radial;
            y = (yd - dy) / radial;
        }
        Point2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> CameraModel {
        CameraModel::new(
            467.74270306499267,
            467.74270306499267,
            320.5,
            240.5,
            [0.0; 5],
            (640, 480),
            (1.2, 1.1),
        )
        .unwrap()
    }

    #[test]
    fn zero_focal_length_is_rejected() {
        let err = CameraModel::new(0.0, 500.0, 320.0, 240.0, [0.0; 5], (640, 480), (1.2, 1.1));
        assert!(matches!(
            err,
            Err(CameraModelError::DegenerateIntrinsics { .. })
        ));
    }

    #[test]
    fn center_pixel_has_zero_angle() {
        let m = model();
        let a = m.pixel_to_angle(Point2::new(320.0, 240.0));
        assert_relative_eq!(a.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(a.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn angle_is_linear_in_pixel_offset() {
        let m = model();
        let a = m.pixel_to_angle(Point2::new(480.0, 240.0));
        // (480 - 320) * 1.2 / 640
        assert_relative_eq!(a.x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(a.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn undistort_without_coefficients_is_pinhole_inverse() {
        let m = model();
        let n = m.undistort_point(Point2::new(m.cx + m.fx, m.cy));
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn undistort_inverts_radial_distortion() {
        let mut m = model();
        m.distortion = [-0.2, 0.05, 0.0, 0.0, 0.0];

        // Distort a known normalized point forward, then invert.
        let (x, y) = (0.2_f64, -0.1_f64);
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (m.distortion[0] + r2 * m.distortion[1]);
        let u = m.cx + m.fx * x * radial;
        let v = m.cy + m.fy * y * radial;

        let n = m.undistort_point(Point2::new(u, v));
        assert_relative_eq!(n.x, x, epsilon = 1e-8);
        assert_relative_eq!(n.y, y, epsilon = 1e-8);
    }
}
