//! Synthetic marker rendering.
//!
//! Used by examples and tests to produce frames with known ground truth;
//! the bit layout mirrors the decoder exactly (row-major, black = 1).

use marker_servo_core::GrayImage;

use crate::Dictionary;

/// Render one marker (black border + bit grid) as a standalone patch.
///
/// Returns `None` for an id outside the dictionary.
pub fn render_marker(dict: &Dictionary, id: u32, module_px: usize) -> Option<GrayImage> {
    let code = *dict.codes.get(id as usize)?;
    let cells = dict.cells_per_side();
    let size = cells * module_px;
    let mut img = GrayImage {
        width: size,
        height: size,
        data: vec![255; size * size],
    };

    for cy in 0..cells {
        for cx in 0..cells {
            let is_border = cx == 0 || cy == 0 || cx == cells - 1 || cy == cells - 1;
            let black = if is_border {
                true
            } else {
                let n = dict.marker_size;
                let bit = (code >> ((cy - 1) * n + (cx - 1))) & 1;
                bit == 1
            };
            if black {
                for y in cy * module_px..(cy + 1) * module_px {
                    for x in cx * module_px..(cx + 1) * module_px {
                        img.data[y * size + x] = 0;
                    }
                }
            }
        }
    }

    Some(img)
}

/// Stamp a marker into a larger image at `(x0, y0)` (top-left corner).
///
/// Pixels falling outside the destination are clipped.
pub fn stamp_marker(
    dst: &mut GrayImage,
    dict: &Dictionary,
    id: u32,
    x0: usize,
    y0: usize,
    module_px: usize,
) {
    let Some(patch) = render_marker(dict, id, module_px) else {
        return;
    };
    for y in 0..patch.height {
        let dy = y0 + y;
        if dy >= dst.height {
            break;
        }
        for x in 0..patch.width {
            let dx = x0 + x;
            if dx >= dst.width {
                break;
            }
            dst.data[dy * dst.width + dx] = patch.data[y * patch.width + x];
        }
    }
}
