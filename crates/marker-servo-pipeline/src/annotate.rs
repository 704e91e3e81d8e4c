//! Frame annotation for the output stream.

use nalgebra::Point2;

use marker_servo_core::Frame;

use crate::target::Target;

const TARGET_COLOR: [u8; 3] = [255, 0, 0];
const CENTROID_RADIUS: i32 = 4;

/// Produce the annotated copy that gets republished downstream.
///
/// When a target is selected, its quadrilateral outline and centroid dot are
/// drawn; otherwise the copy is returned untouched.
pub fn annotate_frame(frame: &Frame, target: Option<&Target>) -> Frame {
    let mut out = frame.clone();
    if let Some(t) = target {
        draw_quad(&mut out, &t.marker.corners);
        draw_disc(&mut out, t.centroid, CENTROID_RADIUS);
    }
    out
}

fn draw_quad(frame: &mut Frame, corners: &[Point2<f32>; 4]) {
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        draw_line(frame, a, b);
    }
}

/// Bresenham segment.
fn draw_line(frame: &mut Frame, a: Point2<f32>, b: Point2<f32>) {
    let (mut x0, mut y0) = (a.x.round() as i32, a.y.round() as i32);
    let (x1, y1) = (b.x.round() as i32, b.y.round() as i32);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        frame.put_pixel(x0, y0, TARGET_COLOR);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_disc(frame: &mut Frame, center: Point2<f32>, radius: i32) {
    let cx = center.x.round() as i32;
    let cy = center.y.round() as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                frame.put_pixel(cx + dx, cy + dy, TARGET_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_servo_core::DetectedMarker;
    use marker_servo_pose::MarkerPose;
    use nalgebra::{Vector2, Vector3};
    use std::time::Instant;

    fn blank_frame(w: u32, h: u32) -> Frame {
        Frame::new(w, h, vec![0u8; (w * h * 3) as usize], Instant::now()).unwrap()
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * frame.width + x) * 3) as usize;
        frame.data()[idx..idx + 3].try_into().unwrap()
    }

    fn target() -> Target {
        let marker = DetectedMarker {
            id: 0,
            corners: [
                Point2::new(10.0, 10.0),
                Point2::new(50.0, 10.0),
                Point2::new(50.0, 50.0),
                Point2::new(10.0, 50.0),
            ],
        };
        Target {
            centroid: marker.centroid(),
            marker,
            pose: MarkerPose {
                rvec: Vector3::zeros(),
                tvec: Vector3::new(0.0, 0.0, 2.0),
                error: 0.0,
                alternate: None,
            },
            depth: 2.0,
            angles: Vector2::zeros(),
        }
    }

    #[test]
    fn no_target_returns_an_untouched_copy() {
        let frame = blank_frame(64, 64);
        let out = annotate_frame(&frame, None);
        assert_eq!(out.data(), frame.data());
    }

    #[test]
    fn outline_and_centroid_are_drawn() {
        let frame = blank_frame(64, 64);
        let t = target();
        let out = annotate_frame(&frame, Some(&t));

        // a point on the top edge, one on the left edge, and the centroid
        assert_eq!(pixel(&out, 30, 10), TARGET_COLOR);
        assert_eq!(pixel(&out, 10, 30), TARGET_COLOR);
        assert_eq!(pixel(&out, 30, 30), TARGET_COLOR);
        // source frame untouched
        assert_eq!(pixel(&frame, 30, 10), [0, 0, 0]);
    }

    #[test]
    fn drawing_clips_at_frame_edges() {
        let frame = blank_frame(32, 32);
        let mut t = target();
        t.marker.corners = [
            Point2::new(-10.0, -10.0),
            Point2::new(40.0, -10.0),
            Point2::new(40.0, 40.0),
            Point2::new(-10.0, 40.0),
        ];
        t.centroid = Point2::new(15.0, 15.0);
        // must not panic
        let _ = annotate_frame(&frame, Some(&t));
    }
}
