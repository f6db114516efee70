//! Pure calculation functions for crop geometry, size budgets and the quality ladder.
//!
//! All functions here are pure and testable without any I/O or images.

/// Bytes in one megabyte of size budget.
///
/// Binary megabytes: a "1 MB" budget is 1,048,576 bytes.
pub const BYTES_PER_MB: u64 = 1_048_576;

/// Largest accepted target width or height, in pixels.
///
/// An 8192×8192 RGB buffer is 192 MiB; beyond that a typo in a target size
/// turns into an allocation the process cannot survive.
pub const MAX_TARGET_SIDE: u32 = 8192;

/// Square crop placed inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    /// Width and height of the square.
    pub side: u32,
}

/// Convert a physical crop size to pixels: `round(inches * dpi)`.
///
/// Halves round away from zero. Inputs are assumed positive and finite;
/// validation happens before this is called.
///
/// # Examples
/// ```
/// # use pixellate::imaging::calculations::crop_side_px;
/// assert_eq!(crop_side_px(2.0, 300), 600);
/// assert_eq!(crop_side_px(0.5, 3), 2); // 1.5 rounds up
/// ```
pub fn crop_side_px(crop_inches: f64, dpi: u32) -> u32 {
    // `as` saturates, so absurd inputs clamp to u32::MAX and are then cut
    // down to the source size by `centered_square`.
    (crop_inches * f64::from(dpi)).round() as u32
}

/// Center a square of `requested_side` pixels inside `source`.
///
/// The side is clamped to the shorter source edge, so the crop never reaches
/// outside the image. Offsets use integer division: when the leftover margin
/// is odd, the extra pixel ends up on the right (or bottom).
///
/// # Arguments
/// * `source` - Source image dimensions (width, height)
/// * `requested_side` - Desired square side in pixels
pub fn centered_square(source: (u32, u32), requested_side: u32) -> CropRegion {
    let (width, height) = source;
    let side = requested_side.min(width).min(height);
    CropRegion {
        left: (width - side) / 2,
        top: (height - side) / 2,
        side,
    }
}

/// Convert a megabyte budget to bytes, truncating toward zero.
///
/// Non-positive or non-finite input yields 0.
pub fn mb_to_bytes(mb: f64) -> u64 {
    if mb.is_finite() && mb > 0.0 {
        (mb * BYTES_PER_MB as f64) as u64
    } else {
        0
    }
}

/// Qualities to try, from `initial` down to `floor` in steps of `step`.
///
/// The floor is always the last entry even when the step skips past it.
/// Returns `[initial]` when `floor >= initial`.
pub fn quality_ladder(initial: u8, floor: u8, step: u8) -> Vec<u8> {
    let step = step.max(1);
    let floor = floor.min(initial);
    let mut ladder = Vec::new();
    let mut quality = initial;
    while quality > floor {
        ladder.push(quality);
        quality = quality.saturating_sub(step);
    }
    ladder.push(floor);
    ladder
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // crop_side_px tests
    // =========================================================================

    #[test]
    fn crop_side_two_inches_at_300_dpi() {
        assert_eq!(crop_side_px(2.0, 300), 600);
    }

    #[test]
    fn crop_side_rounds_to_nearest() {
        // 0.333.. * 300 = 99.999..
        assert_eq!(crop_side_px(1.0 / 3.0, 300), 100);
        // 1.4 * 1 = 1.4
        assert_eq!(crop_side_px(1.4, 1), 1);
    }

    #[test]
    fn crop_side_half_rounds_up() {
        assert_eq!(crop_side_px(0.5, 3), 2);
        assert_eq!(crop_side_px(2.5, 1), 3);
    }

    #[test]
    fn crop_side_tiny_rounds_to_zero() {
        assert_eq!(crop_side_px(0.001, 72), 0);
    }

    // =========================================================================
    // centered_square tests
    // =========================================================================

    #[test]
    fn centered_square_portrait_source() {
        // 2000x3000 source, 600px crop → left 700, top 1200
        assert_eq!(
            centered_square((2000, 3000), 600),
            CropRegion {
                left: 700,
                top: 1200,
                side: 600
            }
        );
    }

    #[test]
    fn centered_square_clamps_to_short_edge() {
        assert_eq!(
            centered_square((400, 400), 600),
            CropRegion {
                left: 0,
                top: 0,
                side: 400
            }
        );
        assert_eq!(
            centered_square((1000, 300), 600),
            CropRegion {
                left: 350,
                top: 0,
                side: 300
            }
        );
    }

    #[test]
    fn centered_square_odd_margin_floors() {
        // 5 - 2 = 3 leftover columns → 1 on the left, 2 on the right
        assert_eq!(
            centered_square((5, 4), 2),
            CropRegion {
                left: 1,
                top: 1,
                side: 2
            }
        );
        // 4 - 3 = 1 leftover row → 0 on top, 1 on the bottom
        assert_eq!(centered_square((5, 4), 3).top, 0);
    }

    #[test]
    fn centered_square_exact_fit() {
        assert_eq!(
            centered_square((600, 600), 600),
            CropRegion {
                left: 0,
                top: 0,
                side: 600
            }
        );
    }

    // =========================================================================
    // mb_to_bytes tests
    // =========================================================================

    #[test]
    fn mb_to_bytes_uses_binary_megabytes() {
        assert_eq!(mb_to_bytes(1.0), 1_048_576);
        assert_eq!(mb_to_bytes(0.5), 524_288);
        assert_eq!(mb_to_bytes(10.0), 10_485_760);
    }

    #[test]
    fn mb_to_bytes_truncates() {
        // 0.1 MB = 104857.6 bytes
        assert_eq!(mb_to_bytes(0.1), 104_857);
    }

    #[test]
    fn mb_to_bytes_rejects_non_positive() {
        assert_eq!(mb_to_bytes(0.0), 0);
        assert_eq!(mb_to_bytes(-1.0), 0);
        assert_eq!(mb_to_bytes(f64::NAN), 0);
    }

    // =========================================================================
    // quality_ladder tests
    // =========================================================================

    #[test]
    fn ladder_default_bounds() {
        let ladder = quality_ladder(95, 10, 5);
        assert_eq!(ladder.len(), 18);
        assert_eq!(&ladder[..3], &[95, 90, 85]);
        assert_eq!(ladder.last(), Some(&10));
    }

    #[test]
    fn ladder_always_ends_on_floor() {
        assert_eq!(quality_ladder(95, 10, 20), vec![95, 75, 55, 35, 15, 10]);
    }

    #[test]
    fn ladder_single_entry_when_floor_meets_initial() {
        assert_eq!(quality_ladder(50, 50, 5), vec![50]);
        assert_eq!(quality_ladder(50, 70, 5), vec![50]);
    }

    #[test]
    fn ladder_zero_step_is_treated_as_one() {
        assert_eq!(quality_ladder(3, 1, 0), vec![3, 2, 1]);
    }

    #[test]
    fn ladder_large_step_does_not_underflow() {
        assert_eq!(quality_ladder(10, 1, 200), vec![10, 1]);
    }
}
