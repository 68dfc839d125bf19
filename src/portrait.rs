//! Portrait-mode background blur
//!
//! Uses the reconciled binary mask to keep the target sharp while blurring
//! everything the model classified as background.

use crate::error::{Result, SegmentationError};
use image::{DynamicImage, GenericImageView, RgbaImage};

/// Blur the background of `original` using the reconciled mask
///
/// Mask polarity follows the decoder: black pixels are the target and keep
/// the original, white pixels take the blurred image. The mask must already
/// be at the original's dimensions (see [`crate::geometry::reconcile`]).
///
/// # Errors
///
/// Returns `InvalidImage` when the mask and image dimensions differ.
pub fn apply_portrait_effect(
    original: &DynamicImage,
    mask: &RgbaImage,
    blur_sigma: f32,
) -> Result<RgbaImage> {
    let (width, height) = original.dimensions();
    if (width, height) != mask.dimensions() {
        return Err(SegmentationError::invalid_image(format!(
            "Mask dimensions {:?} do not match image dimensions {:?}",
            mask.dimensions(),
            (width, height)
        )));
    }

    let sharp = original.to_rgba8();
    let blurred = image::imageops::blur(&sharp, blur_sigma);

    let mut result: RgbaImage = image::ImageBuffer::new(width, height);
    for (x, y, mask_pixel) in mask.enumerate_pixels() {
        let source = if mask_pixel[0] < 128 {
            sharp.get_pixel(x, y)
        } else {
            blurred.get_pixel(x, y)
        };
        result.put_pixel(x, y, *source);
    }

    Ok(result)
}
