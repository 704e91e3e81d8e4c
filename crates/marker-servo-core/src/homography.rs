use crate::image::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// A 2D projective transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new((v[0] / v[2]) as f32, (v[1] / v[2]) as f32)
    }

    #[inline]
    pub fn apply_f64(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Similarity transform that centers 4 points and scales their mean distance
/// to sqrt(2) (Hartley conditioning).
fn conditioning_transform(pts: &[Point2<f64>; 4]) -> Matrix3<f64> {
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx *= 0.25;
    cy *= 0.25;

    let mut mean_dist = 0.0;
    for p in pts {
        mean_dist += ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
    }
    mean_dist *= 0.25;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn condition(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let t = conditioning_transform(pts);
    let mut out = [Point2::new(0.0, 0.0); 4];
    for (o, p) in out.iter_mut().zip(pts) {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        *o = Point2::new(v[0], v[1]);
    }
    (out, t)
}

/// Compute H such that `dst ~ H * src` from 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when the correspondences are degenerate (coincident or collinear points).
pub fn homography_from_4pt(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Option<Homography> {
    let (src_n, t_src) = condition(src);
    let (dst_n, t_dst) = condition(dst);

    // Unknowns [h11..h32] with h33 = 1:
    //   h11 x + h12 y + h13 - u h31 x - u h32 y = u
    //   h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    let h = t_dst.try_inverse()? * hn * t_src;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    Some(Homography::new(h / scale))
}

/// Warp the quadrilateral `corners` (TL, TR, BR, BL in image coordinates)
/// into an axis-aligned `size x size` patch.
pub fn warp_quad_to_square(
    src: &GrayImageView<'_>,
    corners: &[Point2<f32>; 4],
    size: usize,
) -> Option<GrayImage> {
    let s = size as f64;
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(s, 0.0),
        Point2::new(s, s),
        Point2::new(0.0, s),
    ];
    let quad = corners.map(|p| Point2::new(p.x as f64, p.y as f64));
    let h = homography_from_4pt(&square, &quad)?;

    let mut out = vec![0u8; size * size];
    for y in 0..size {
        for x in 0..size {
            // sample at pixel center
            let p = h.apply_f64(Point2::new(x as f64 + 0.5, y as f64 + 0.5));
            out[y * size + x] = sample_bilinear_u8(src, p.x as f32, p.y as f32);
        }
    }
    Some(GrayImage {
        width: size,
        height: size,
        data: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6})",
            a.x,
            a.y,
            b.x,
            b.y
        );
    }

    #[test]
    fn recovers_known_projective_transform() {
        let truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(180.0, 0.0),
            Point2::new(180.0, 130.0),
            Point2::new(0.0, 130.0),
        ];
        let dst = src.map(|p| truth.apply_f64(p));

        let recovered = homography_from_4pt(&src, &dst).expect("recoverable");
        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply_f64(p), truth.apply_f64(p), 1e-6);
        }
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let src = [Point2::new(1.0, 1.0); 4];
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn inverse_round_trips() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");
        for p in [Point2::new(0.0, 0.0), Point2::new(320.0, 200.0)] {
            assert_close(inv.apply_f64(h.apply_f64(p)), p, 1e-9);
        }
    }

    #[test]
    fn warp_of_axis_aligned_square_copies_pixels() {
        // 8x8 image, left half black, right half white.
        let mut data = vec![0u8; 64];
        for y in 0..8 {
            for x in 4..8 {
                data[y * 8 + x] = 255;
            }
        }
        let img = GrayImage {
            width: 8,
            height: 8,
            data,
        };
        let corners = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(8.0, 0.0),
            Point2::new(8.0, 8.0),
            Point2::new(0.0, 8.0),
        ];
        let warped = warp_quad_to_square(&img.view(), &corners, 8).expect("warp");
        assert!(warped.data[8 * 4] < 64);
        assert!(warped.data[8 * 4 + 6] > 192);
    }
}
