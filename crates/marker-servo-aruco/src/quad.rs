//! Quad candidate extraction.
//!
//! Frame -> adaptive threshold -> boundary tracing -> polygon simplification
//! -> convex 4-gon filtering. Candidates are geometric only; decoding decides
//! whether a quad is actually a marker.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use marker_servo_core::GrayImageView;

use crate::threshold::adaptive_threshold_dark;

/// Tuning knobs for candidate extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuadParams {
    /// Half-width of the adaptive-threshold window in pixels.
    pub adaptive_radius: usize,
    /// A pixel must be this far below the window mean to count as dark.
    pub adaptive_offset: i32,
    /// Minimum contour length as a fraction of the image width.
    pub min_perimeter_rel: f32,
    /// Minimum quad edge length in pixels.
    pub min_edge_px: f32,
    /// Polygon simplification tolerance as a fraction of the contour length.
    pub poly_epsilon_rel: f64,
    /// Candidates whose corners sit closer than this (mean distance) are
    /// considered duplicates; the larger quad wins.
    pub min_pair_dist_px: f32,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            adaptive_radius: 8,
            adaptive_offset: 10,
            min_perimeter_rel: 0.01,
            min_edge_px: 10.0,
            poly_epsilon_rel: 0.05,
            min_pair_dist_px: 30.0,
        }
    }
}

/// Extract convex quadrilateral candidates from a grayscale image.
///
/// Corners come back in clockwise order (image coordinates, y down) with an
/// arbitrary starting corner; decoding canonicalizes the rotation.
pub fn find_quad_candidates(src: &GrayImageView<'_>, params: &QuadParams) -> Vec<[Point2<f32>; 4]> {
    let binary = adaptive_threshold_dark(src, params.adaptive_radius, params.adaptive_offset);
    let contours = trace_boundaries(&binary.view());

    let min_len = ((src.width as f32) * params.min_perimeter_rel).max(8.0) as usize;
    let mut candidates = Vec::new();

    for contour in &contours {
        if contour.len() < min_len {
            continue;
        }
        let epsilon = contour.len() as f64 * params.poly_epsilon_rel;
        let poly = approx_closed_polygon(contour, epsilon);
        if poly.len() != 4 || !is_convex(&poly) {
            continue;
        }
        if min_edge(&poly) < params.min_edge_px as f64 {
            continue;
        }

        let mut corners = [
            Point2::new(poly[0].0 as f32, poly[0].1 as f32),
            Point2::new(poly[1].0 as f32, poly[1].1 as f32),
            Point2::new(poly[2].0 as f32, poly[2].1 as f32),
            Point2::new(poly[3].0 as f32, poly[3].1 as f32),
        ];
        make_clockwise(&mut corners);
        candidates.push(corners);
    }

    suppress_duplicates(candidates, params.min_pair_dist_px)
}

/// Trace component boundaries in a binary image (radial sweep, 8-connected).
fn trace_boundaries(bin: &GrayImageView<'_>) -> Vec<Vec<(i32, i32)>> {
    let w = bin.width;
    let h = bin.height;
    let pw = w + 2;

    // Padded working copy: 0 background, 1 foreground, 2 visited.
    let mut grid = vec![0u8; pw * (h + 2)];
    for y in 0..h {
        for x in 0..w {
            if bin.data[y * w + x] != 0 {
                grid[(y + 1) * pw + (x + 1)] = 1;
            }
        }
    }

    let mut contours = Vec::new();
    for y in 1..=h {
        for x in 1..=w {
            let here = grid[y * pw + x];
            // Start only on fresh boundary pixels entered from the left.
            if here == 1 && grid[y * pw + x - 1] == 0 {
                contours.push(trace_from(&mut grid, pw, x as i32, y as i32));
            }
        }
    }
    contours
}

// Clockwise 8-neighborhood in image coordinates (y grows down).
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn trace_from(grid: &mut [u8], pw: usize, sx: i32, sy: i32) -> Vec<(i32, i32)> {
    let at = |x: i32, y: i32| (y as usize) * pw + x as usize;

    let mut contour = Vec::new();
    let (mut cx, mut cy) = (sx, sy);
    // Entered while scanning left-to-right, so the backtrack direction is west.
    let mut back = 4usize;
    let mut first_move: Option<(i32, i32, usize)> = None;

    loop {
        contour.push((cx - 1, cy - 1)); // unpad
        grid[at(cx, cy)] = 2;

        let mut step = None;
        for k in 1..=8 {
            let dir = (back + k) % 8;
            let (dx, dy) = NEIGHBORS[dir];
            if grid[at(cx + dx, cy + dy)] > 0 {
                step = Some(dir);
                break;
            }
        }
        let Some(dir) = step else {
            break; // isolated pixel
        };

        if let Some(first) = first_move {
            if (cx, cy, dir) == (first.0, first.1, first.2) {
                contour.pop(); // start pixel was re-pushed on closure
                break;
            }
        } else {
            first_move = Some((cx, cy, dir));
        }

        let (dx, dy) = NEIGHBORS[dir];
        cx += dx;
        cy += dy;
        back = (dir + 4) % 8;

        if contour.len() > 4 * pw * pw {
            log::warn!("boundary trace did not close, aborting contour");
            break;
        }
    }

    contour
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is split at its two mutually farthest points and each open
/// chain is simplified independently.
fn approx_closed_polygon(contour: &[(i32, i32)], epsilon: f64) -> Vec<(i32, i32)> {
    let n = contour.len();
    if n < 4 {
        return contour.to_vec();
    }

    let dist2 = |a: (i32, i32), b: (i32, i32)| {
        let dx = (a.0 - b.0) as f64;
        let dy = (a.1 - b.1) as f64;
        dx * dx + dy * dy
    };

    let mut a = 0;
    for (i, &p) in contour.iter().enumerate() {
        if dist2(contour[0], p) > dist2(contour[0], contour[a]) {
            a = i;
        }
    }
    let mut b = a;
    for (i, &p) in contour.iter().enumerate() {
        if dist2(contour[a], p) > dist2(contour[a], contour[b]) {
            b = i;
        }
    }
    let (a, b) = (a.min(b), a.max(b));

    let mut poly = Vec::new();
    simplify_chain(&contour[a..=b], epsilon, &mut poly);
    let mut wrap: Vec<(i32, i32)> = contour[b..].to_vec();
    wrap.extend_from_slice(&contour[..=a]);
    simplify_chain(&wrap, epsilon, &mut poly);
    poly
}

/// Append the simplified chain, excluding its final point.
fn simplify_chain(chain: &[(i32, i32)], epsilon: f64, out: &mut Vec<(i32, i32)>) {
    if chain.len() < 2 {
        out.extend_from_slice(chain);
        return;
    }

    let first = chain[0];
    let last = chain[chain.len() - 1];
    let dx = (last.0 - first.0) as f64;
    let dy = (last.1 - first.1) as f64;
    let seg_len = (dx * dx + dy * dy).sqrt().max(1e-9);

    let mut max_dist = 0.0;
    let mut split = 0;
    for (i, &p) in chain.iter().enumerate().skip(1).take(chain.len() - 2) {
        let px = (p.0 - first.0) as f64;
        let py = (p.1 - first.1) as f64;
        let d = (py * dx - px * dy).abs() / seg_len;
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }

    if max_dist > epsilon {
        simplify_chain(&chain[..=split], epsilon, out);
        simplify_chain(&chain[split..], epsilon, out);
    } else {
        out.push(first);
    }
}

fn is_convex(poly: &[(i32, i32)]) -> bool {
    let n = poly.len();
    let mut sign = 0i32;
    for i in 0..n {
        let p0 = poly[i];
        let p1 = poly[(i + 1) % n];
        let p2 = poly[(i + 2) % n];
        let cross = (p1.0 - p0.0) as i64 * (p2.1 - p1.1) as i64
            - (p1.1 - p0.1) as i64 * (p2.0 - p1.0) as i64;
        if cross != 0 {
            let s = if cross > 0 { 1 } else { -1 };
            if sign == 0 {
                sign = s;
            } else if sign != s {
                return false;
            }
        }
    }
    true
}

fn min_edge(poly: &[(i32, i32)]) -> f64 {
    let n = poly.len();
    let mut min_d = f64::INFINITY;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let dx = (a.0 - b.0) as f64;
        let dy = (a.1 - b.1) as f64;
        min_d = min_d.min((dx * dx + dy * dy).sqrt());
    }
    min_d
}

/// Reorder corners clockwise (image coordinates, y down).
fn make_clockwise(corners: &mut [Point2<f32>; 4]) {
    let dx1 = corners[1].x - corners[0].x;
    let dy1 = corners[1].y - corners[0].y;
    let dx2 = corners[2].x - corners[0].x;
    let dy2 = corners[2].y - corners[0].y;
    if dx1 * dy2 - dy1 * dx2 < 0.0 {
        corners.swap(1, 3);
    }
}

fn perimeter(corners: &[Point2<f32>; 4]) -> f32 {
    let mut p = 0.0;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        p += ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    }
    p
}

/// Drop near-duplicate candidates (nested or double-traced quads), keeping
/// the one with the larger perimeter.
fn suppress_duplicates(
    candidates: Vec<[Point2<f32>; 4]>,
    min_dist: f32,
) -> Vec<[Point2<f32>; 4]> {
    let n = candidates.len();
    let mut dropped = vec![false; n];

    for i in 0..n {
        for j in (i + 1)..n {
            // Starting corners are arbitrary, so align cyclically first.
            let mut dist = f32::INFINITY;
            for shift in 0..4 {
                let mut d = 0.0;
                for k in 0..4 {
                    let dx = candidates[i][k].x - candidates[j][(k + shift) % 4].x;
                    let dy = candidates[i][k].y - candidates[j][(k + shift) % 4].y;
                    d += dx * dx + dy * dy;
                }
                dist = dist.min(d);
            }
            if dist / 4.0 < min_dist * min_dist {
                if perimeter(&candidates[i]) < perimeter(&candidates[j]) {
                    dropped[i] = true;
                } else {
                    dropped[j] = true;
                }
            }
        }
    }

    candidates
        .into_iter()
        .zip(dropped)
        .filter_map(|(c, d)| (!d).then_some(c))
        .collect()
}
