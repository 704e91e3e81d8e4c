//! Per-quad marker decoding.
//!
//! A candidate quad is unwarped into a square patch, thresholded with Otsu,
//! checked for the black border, and its inner bit grid matched against the
//! dictionary. On success the corners are rotated so that index 0 is the
//! marker's own top-left corner.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use marker_servo_core::{warp_quad_to_square, DetectedMarker, GrayImageView};

use crate::matcher::Matcher;
use crate::threshold::otsu_threshold_from_samples;

/// Decoder configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodeParams {
    /// Patch pixels per marker cell after unwarping.
    pub px_per_cell: usize,
    /// Fraction of a cell to ignore near its edges when sampling.
    pub inset_frac: f32,
    /// Fraction of border cells that must be black.
    pub min_border_score: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            px_per_cell: 8,
            inset_frac: 0.15,
            min_border_score: 0.85,
        }
    }
}

/// A successfully decoded quad.
#[derive(Clone, Debug)]
pub struct DecodedQuad {
    pub marker: DetectedMarker,
    pub hamming: u8,
    pub border_score: f32,
}

/// Decode one candidate quad (clockwise corners, arbitrary start).
pub fn decode_quad(
    image: &GrayImageView<'_>,
    corners: &[Point2<f32>; 4],
    params: &DecodeParams,
    matcher: &Matcher,
) -> Option<DecodedQuad> {
    let dict = matcher.dictionary();
    let cells = dict.cells_per_side();
    let patch_size = cells * params.px_per_cell.max(2);

    let patch = warp_quad_to_square(image, corners, patch_size)?;
    let threshold = otsu_threshold_from_samples(&patch.data);

    // Cell-level black/white classification.
    let mut black = vec![false; cells * cells];
    for cy in 0..cells {
        for cx in 0..cells {
            black[cy * cells + cx] = cell_is_black(
                &patch.data,
                patch_size,
                cx,
                cy,
                params.px_per_cell.max(2),
                params.inset_frac,
                threshold,
            );
        }
    }

    // Border must be black.
    let mut border_black = 0usize;
    let mut border_total = 0usize;
    for cy in 0..cells {
        for cx in 0..cells {
            if cx == 0 || cy == 0 || cx == cells - 1 || cy == cells - 1 {
                border_total += 1;
                if black[cy * cells + cx] {
                    border_black += 1;
                }
            }
        }
    }
    let border_score = border_black as f32 / border_total as f32;
    if border_score < params.min_border_score {
        return None;
    }

    // Inner bits, row-major, black = 1.
    let n = dict.marker_size;
    let mut code = 0u64;
    for y in 0..n {
        for x in 0..n {
            if black[(y + 1) * cells + (x + 1)] {
                code |= 1u64 << (y * n + x);
            }
        }
    }

    let m = matcher.best_match(code)?;

    // The observed grid equals the canonical code rotated `m.rotation`
    // quarter turns clockwise, so the canonical top-left corner sits at
    // patch corner `m.rotation`.
    let r = m.rotation as usize;
    let canonical = [
        corners[r % 4],
        corners[(r + 1) % 4],
        corners[(r + 2) % 4],
        corners[(r + 3) % 4],
    ];

    Some(DecodedQuad {
        marker: DetectedMarker {
            id: m.id,
            corners: canonical,
        },
        hamming: m.hamming,
        border_score,
    })
}

fn cell_is_black(
    patch: &[u8],
    patch_size: usize,
    cx: usize,
    cy: usize,
    px_per_cell: usize,
    inset_frac: f32,
    threshold: u8,
) -> bool {
    let inset = ((px_per_cell as f32 * inset_frac) as usize).min(px_per_cell / 2 - 1);
    let x0 = cx * px_per_cell + inset;
    let x1 = (cx + 1) * px_per_cell - inset;
    let y0 = cy * px_per_cell + inset;
    let y1 = (cy + 1) * px_per_cell - inset;

    let mut dark = 0usize;
    let mut total = 0usize;
    for y in y0..y1.min(patch_size) {
        for x in x0..x1.min(patch_size) {
            total += 1;
            if patch[y * patch_size + x] < threshold {
                dark += 1;
            }
        }
    }
    total > 0 && 2 * dark >= total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DICT_4X4_16;
    use crate::render::stamp_marker;
    use marker_servo_core::GrayImage;

    fn rendered(id: u32, module_px: usize) -> (GrayImage, [Point2<f32>; 4]) {
        let cells = DICT_4X4_16.cells_per_side();
        let size = cells * module_px;
        let margin = 2 * module_px;
        let dim = size + 2 * margin;
        let mut img = GrayImage {
            width: dim,
            height: dim,
            data: vec![255; dim * dim],
        };
        stamp_marker(&mut img, &DICT_4X4_16, id, margin, margin, module_px);
        let (a, b) = (margin as f32, (margin + size) as f32);
        let corners = [
            Point2::new(a, a),
            Point2::new(b, a),
            Point2::new(b, b),
            Point2::new(a, b),
        ];
        (img, corners)
    }

    #[test]
    fn decodes_rendered_marker() {
        let (img, corners) = rendered(9, 8);
        let matcher = Matcher::new(DICT_4X4_16, 0);
        let decoded =
            decode_quad(&img.view(), &corners, &DecodeParams::default(), &matcher).expect("decode");
        assert_eq!(decoded.marker.id, 9);
        assert_eq!(decoded.hamming, 0);
        assert!(decoded.border_score > 0.99);
        assert_eq!(decoded.marker.corners, corners);
    }

    #[test]
    fn rotated_corner_order_is_canonicalized() {
        let (img, corners) = rendered(4, 8);
        // Same quad handed over starting at its bottom-left corner: the image
        // content is then rotated one quarter turn relative to the patch.
        let shifted = [corners[3], corners[0], corners[1], corners[2]];
        let matcher = Matcher::new(DICT_4X4_16, 0);
        let decoded =
            decode_quad(&img.view(), &shifted, &DecodeParams::default(), &matcher).expect("decode");
        assert_eq!(decoded.marker.id, 4);
        assert_eq!(decoded.marker.corners, corners);
    }

    #[test]
    fn solid_quad_fails_the_border_check() {
        let dim = 80;
        let img = GrayImage {
            width: dim,
            height: dim,
            data: vec![0; dim * dim],
        };
        let corners = [
            Point2::new(10.0, 10.0),
            Point2::new(70.0, 10.0),
            Point2::new(70.0, 70.0),
            Point2::new(10.0, 70.0),
        ];
        let matcher = Matcher::new(DICT_4X4_16, 2);
        assert!(decode_quad(&img.view(), &corners, &DecodeParams::default(), &matcher).is_none());
    }

    #[test]
    fn white_quad_fails_the_border_check() {
        let dim = 80;
        let img = GrayImage {
            width: dim,
            height: dim,
            data: vec![255; dim * dim],
        };
        let corners = [
            Point2::new(10.0, 10.0),
            Point2::new(70.0, 10.0),
            Point2::new(70.0, 70.0),
            Point2::new(10.0, 70.0),
        ];
        let matcher = Matcher::new(DICT_4X4_16, 2);
        assert!(decode_quad(&img.view(), &corners, &DecodeParams::default(), &matcher).is_none());
    }
}
