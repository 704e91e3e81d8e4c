//! Thresholding utilities.

use marker_servo_core::{GrayImage, GrayImageView};

/// Compute an Otsu threshold from a set of sample intensities.
pub(crate) fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut min_v = 255u8;
    let mut max_v = 0u8;
    for &v in samples {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    // With only two populated bins the between-class variance is flat across
    // the whole valley; split it in the middle so `v < t` separates them.
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let mut sum_total = 0f64;
    for (i, &h) in hist.iter().enumerate() {
        sum_total += (i as f64) * (h as f64);
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Mean adaptive threshold with dark pixels as foreground (255).
///
/// A pixel becomes foreground when it is at least `offset` below the local
/// window mean, which keeps marker borders connected under uneven lighting.
/// Implemented with an integral image so the window size is free.
pub(crate) fn adaptive_threshold_dark(
    src: &GrayImageView<'_>,
    radius: usize,
    offset: i32,
) -> GrayImage {
    let w = src.width;
    let h = src.height;

    // Summed-area table with a leading zero row/column.
    let mut integral = vec![0u64; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += src.data[y * w + x] as u64;
            integral[(y + 1) * (w + 1) + (x + 1)] = integral[y * (w + 1) + (x + 1)] + row_sum;
        }
    }

    let mut out = vec![0u8; w * h];
    let r = radius as i64;
    for y in 0..h {
        let y0 = (y as i64 - r).max(0) as usize;
        let y1 = ((y as i64 + r + 1).min(h as i64)) as usize;
        for x in 0..w {
            let x0 = (x as i64 - r).max(0) as usize;
            let x1 = ((x as i64 + r + 1).min(w as i64)) as usize;

            let area = ((y1 - y0) * (x1 - x0)) as u64;
            let sum = integral[y1 * (w + 1) + x1] + integral[y0 * (w + 1) + x0]
                - integral[y0 * (w + 1) + x1]
                - integral[y1 * (w + 1) + x0];
            let mean = (sum / area) as i32;

            if (src.data[y * w + x] as i32) < mean - offset {
                out[y * w + x] = 255;
            }
        }
    }

    GrayImage {
        width: w,
        height: h,
        data: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_separates_bimodal_samples() {
        let mut samples = vec![10u8; 50];
        samples.extend(vec![200u8; 50]);
        let t = otsu_threshold_from_samples(&samples);
        assert!(t >= 10 && t < 200, "threshold {t} outside the valley");
    }

    #[test]
    fn otsu_of_uniform_samples_is_that_value() {
        assert_eq!(otsu_threshold_from_samples(&[42; 16]), 42);
    }

    #[test]
    fn adaptive_marks_dark_blob_on_light_background() {
        let w = 32;
        let mut data = vec![200u8; w * w];
        for y in 10..22 {
            for x in 10..22 {
                data[y * w + x] = 20;
            }
        }
        let img = GrayImage {
            width: w,
            height: w,
            data,
        };
        let bin = adaptive_threshold_dark(&img.view(), 8, 10);
        assert_eq!(bin.data[11 * w + 11], 255);
        assert_eq!(bin.data[2 * w + 2], 0);
    }
}
