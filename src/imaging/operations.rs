//! Geometry stages of the pipeline: square crop, then exact resize.
//!
//! Both run on the decoded [`DynamicImage`] and never touch a codec. They
//! validate their own numeric inputs so they can be called on their own.

use super::calculations::{CropRegion, centered_square, crop_side_px};
use super::params::target_side;
use crate::pipeline::PipelineError;
use image::DynamicImage;
use image::imageops::FilterType;

/// Output of the crop stage.
#[derive(Debug, Clone)]
pub struct SquareCrop {
    pub image: DynamicImage,
    /// Where the square sits in the source.
    pub region: CropRegion,
}

/// Cut a centered square of `round(crop_inches * dpi)` pixels out of `image`.
///
/// A crop larger than the source is clamped to the shorter source edge; that
/// is not an error.
///
/// # Errors
/// [`PipelineError::InvalidDimension`] when `crop_inches` is not a positive
/// finite number, when `dpi` is 0, when the source has no pixels, or when the
/// crop rounds down to 0 pixels.
pub fn square_crop(
    image: &DynamicImage,
    crop_inches: f64,
    dpi: u32,
) -> Result<SquareCrop, PipelineError> {
    if !(crop_inches.is_finite() && crop_inches > 0.0) {
        return Err(PipelineError::invalid("crop_size_inches", crop_inches));
    }
    if dpi == 0 {
        return Err(PipelineError::invalid("dpi", dpi));
    }
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid_because(
            "source",
            format!("{width}x{height}"),
            "image has no pixels",
        ));
    }

    let requested = crop_side_px(crop_inches, dpi);
    if requested == 0 {
        return Err(PipelineError::invalid_because(
            "crop_size_inches",
            crop_inches,
            "crop rounds to 0 pixels at this dpi",
        ));
    }

    let region = centered_square((width, height), requested);
    let image = image.crop_imm(region.left, region.top, region.side, region.side);
    Ok(SquareCrop { image, region })
}

/// Resize to exactly `width` × `height` with Lanczos3.
///
/// The aspect ratio is not preserved: a square crop resized to 461×579 is
/// stretched vertically. Either side above
/// [`MAX_TARGET_SIDE`](super::calculations::MAX_TARGET_SIDE) is rejected
/// before anything is allocated.
pub fn resize_to_target(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, PipelineError> {
    target_side("target_width_px", width)?;
    target_side("target_height_px", height)?;
    if (image.width(), image.height()) == (width, height) {
        return Ok(image.clone());
    }
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::MAX_TARGET_SIDE;
    use image::{GenericImageView, RgbImage};

    /// Each pixel encodes its own coordinates, so crops can be located.
    fn coordinate_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x / 256) * 16 + y / 256) as u8])
        }))
    }

    fn invalid_parameter(err: PipelineError) -> &'static str {
        match err {
            PipelineError::InvalidDimension { parameter, .. } => parameter,
            other => panic!("expected InvalidDimension, got {other:?}"),
        }
    }

    #[test]
    fn crop_portrait_source_is_centered() {
        let source = coordinate_image(2000, 3000);
        let crop = square_crop(&source, 2.0, 300).unwrap();

        assert_eq!(crop.region.side, 600);
        assert_eq!((crop.region.left, crop.region.top), (700, 1200));
        assert_eq!(crop.image.dimensions(), (600, 600));
        assert_eq!(crop.image.get_pixel(0, 0), source.get_pixel(700, 1200));
        assert_eq!(crop.image.get_pixel(599, 599), source.get_pixel(1299, 1799));
    }

    #[test]
    fn crop_clamps_to_small_source() {
        let source = coordinate_image(400, 400);
        let crop = square_crop(&source, 2.0, 300).unwrap();
        assert_eq!(crop.region.side, 400);
        assert_eq!((crop.region.left, crop.region.top), (0, 0));
        assert_eq!(crop.image.dimensions(), (400, 400));
    }

    #[test]
    fn crop_clamps_to_short_edge_of_landscape() {
        let source = coordinate_image(900, 500);
        let crop = square_crop(&source, 10.0, 300).unwrap();
        assert_eq!(crop.image.dimensions(), (500, 500));
        assert_eq!(crop.region.left, 200);
        assert_eq!(crop.image.get_pixel(0, 0), source.get_pixel(200, 0));
    }

    #[test]
    fn crop_odd_margin_puts_extra_pixel_right() {
        // 7 wide, 4 side → 3 leftover columns: 1 left, 2 right
        let source = coordinate_image(7, 4);
        let crop = square_crop(&source, 4.0, 1).unwrap();
        assert_eq!(crop.region.left, 1);
        assert_eq!(crop.image.get_pixel(0, 0), source.get_pixel(1, 0));
    }

    #[test]
    fn crop_rejects_non_positive_inches() {
        let source = coordinate_image(10, 10);
        for inches in [0.0, -2.0, f64::NAN] {
            let err = square_crop(&source, inches, 300).unwrap_err();
            assert_eq!(invalid_parameter(err), "crop_size_inches");
        }
    }

    #[test]
    fn crop_rejects_zero_dpi() {
        let source = coordinate_image(10, 10);
        let err = square_crop(&source, 2.0, 0).unwrap_err();
        assert_eq!(invalid_parameter(err), "dpi");
    }

    #[test]
    fn crop_rejects_empty_source() {
        let source = DynamicImage::new_rgb8(0, 10);
        let err = square_crop(&source, 2.0, 300).unwrap_err();
        assert_eq!(err.to_string(), "Invalid source: 0x10 (image has no pixels)");
    }

    #[test]
    fn crop_rejects_crop_rounding_to_zero_pixels() {
        let source = coordinate_image(10, 10);
        let err = square_crop(&source, 0.001, 72).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid crop_size_inches: 0.001 (crop rounds to 0 pixels at this dpi)"
        );
    }

    #[test]
    fn resize_square_to_portrait_target() {
        let square = coordinate_image(600, 600);
        let resized = resize_to_target(&square, 461, 579).unwrap();
        assert_eq!(resized.dimensions(), (461, 579));
    }

    #[test]
    fn resize_upscales_small_crop() {
        let square = coordinate_image(40, 40);
        let resized = resize_to_target(&square, 461, 579).unwrap();
        assert_eq!(resized.dimensions(), (461, 579));
    }

    #[test]
    fn resize_same_size_is_identity() {
        let square = coordinate_image(50, 50);
        let resized = resize_to_target(&square, 50, 50).unwrap();
        assert_eq!(resized, square);
    }

    #[test]
    fn resize_rejects_oversized_target_without_allocating() {
        let square = coordinate_image(10, 10);
        let err = resize_to_target(&square, 200_000, 200_000).unwrap_err();
        assert_eq!(invalid_parameter(err), "target_width_px");
        let err = resize_to_target(&square, 64, MAX_TARGET_SIDE + 1).unwrap_err();
        assert_eq!(invalid_parameter(err), "target_height_px");
    }

    #[test]
    fn resize_rejects_zero_target() {
        let square = coordinate_image(10, 10);
        assert_eq!(
            invalid_parameter(resize_to_target(&square, 0, 10).unwrap_err()),
            "target_width_px"
        );
        assert_eq!(
            invalid_parameter(resize_to_target(&square, 10, 0).unwrap_err()),
            "target_height_px"
        );
    }
}
