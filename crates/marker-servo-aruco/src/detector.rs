use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use marker_servo_core::{DetectedMarker, GrayImageView, MarkerDetector};

use crate::decode::{decode_quad, DecodeParams};
use crate::matcher::Matcher;
use crate::quad::{find_quad_candidates, QuadParams};
use crate::Dictionary;

/// Parameters for the square-fiducial detector.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SquareFiducialParams {
    #[serde(default)]
    pub quad: QuadParams,
    #[serde(default)]
    pub decode: DecodeParams,
    /// Hamming budget; `None` uses the dictionary's correction capability.
    #[serde(default)]
    pub max_hamming: Option<u8>,
}

/// End-to-end square-fiducial marker detector.
///
/// Stateless per frame: candidates and decodes are recomputed from scratch
/// on every call.
pub struct SquareFiducialDetector {
    params: SquareFiducialParams,
    matcher: Matcher,
}

impl SquareFiducialDetector {
    pub fn new(dict: Dictionary, params: SquareFiducialParams) -> Self {
        let budget = params.max_hamming.unwrap_or(dict.max_correction_bits);
        Self {
            matcher: Matcher::new(dict, budget),
            params,
        }
    }

    pub fn params(&self) -> &SquareFiducialParams {
        &self.params
    }

    pub fn dictionary(&self) -> Dictionary {
        self.matcher.dictionary()
    }
}

impl MarkerDetector for SquareFiducialDetector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, image), fields(width = image.width, height = image.height))
    )]
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<DetectedMarker> {
        let candidates = find_quad_candidates(image, &self.params.quad);
        log::debug!("{} quad candidates", candidates.len());

        // Keep the best decode per marker id (lowest Hamming distance).
        let mut best: HashMap<u32, (u8, DetectedMarker)> = HashMap::new();
        for corners in &candidates {
            let Some(decoded) = decode_quad(image, corners, &self.params.decode, &self.matcher)
            else {
                continue;
            };
            match best.get(&decoded.marker.id) {
                Some((h, _)) if *h <= decoded.hamming => {}
                _ => {
                    best.insert(decoded.marker.id, (decoded.hamming, decoded.marker));
                }
            }
        }

        let mut markers: Vec<DetectedMarker> = best.into_values().map(|(_, m)| m).collect();
        // Stable output order regardless of hash iteration.
        markers.sort_by_key(|m| m.id);
        log::debug!("{} markers decoded", markers.len());
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DICT_4X4_16;
    use crate::render::stamp_marker;
    use marker_servo_core::GrayImage;
    use nalgebra::Point2;

    fn white_image(w: usize, h: usize) -> GrayImage {
        GrayImage {
            width: w,
            height: h,
            data: vec![255; w * h],
        }
    }

    fn detector() -> SquareFiducialDetector {
        SquareFiducialDetector::new(DICT_4X4_16, SquareFiducialParams::default())
    }

    #[test]
    fn empty_frame_detects_nothing() {
        let img = white_image(200, 200);
        assert!(detector().detect(&img.view()).is_empty());
    }

    #[test]
    fn detects_a_stamped_marker_with_accurate_corners() {
        let mut img = white_image(240, 240);
        let module = 10;
        stamp_marker(&mut img, &DICT_4X4_16, 7, 60, 80, module);

        let markers = detector().detect(&img.view());
        assert_eq!(markers.len(), 1);
        let m = &markers[0];
        assert_eq!(m.id, 7);

        let size = (DICT_4X4_16.cells_per_side() * module) as f32;
        let expected = [
            Point2::new(60.0, 80.0),
            Point2::new(60.0 + size, 80.0),
            Point2::new(60.0 + size, 80.0 + size),
            Point2::new(60.0, 80.0 + size),
        ];
        for (got, want) in m.corners.iter().zip(expected.iter()) {
            assert!(
                (got.x - want.x).abs() < 3.0 && (got.y - want.y).abs() < 3.0,
                "corner {got:?} vs {want:?}"
            );
        }
    }

    #[test]
    fn detects_multiple_markers_in_one_frame() {
        let mut img = white_image(360, 220);
        stamp_marker(&mut img, &DICT_4X4_16, 1, 40, 60, 10);
        stamp_marker(&mut img, &DICT_4X4_16, 11, 220, 70, 10);

        let markers = detector().detect(&img.view());
        let ids: Vec<u32> = markers.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 11]);
    }
}
