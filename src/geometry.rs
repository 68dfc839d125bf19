//! Inverse letterbox geometry
//!
//! Undoes the padding introduced during preprocessing: crops the centered
//! content region out of the square mask and rescales it to the original
//! image dimensions, so the final mask aligns pixel-for-pixel with the
//! caller's uncropped image.

use crate::error::{Result, SegmentationError};
use crate::preprocess::ResizeGeometry;
use image::RgbaImage;

/// Rescale a square-canvas mask back to the original image dimensions
///
/// The crop region is derived from the same [`ResizeGeometry`] used during
/// preprocessing. When the crop is smaller than the destination in both
/// dimensions, the crop is uniformly overscaled by
/// `max(dest_w / crop_w, dest_h / crop_h)` and center-cropped to exactly
/// `dest_w x dest_h`; otherwise it is resized directly with bilinear
/// filtering. Both paths return exactly `original_width x original_height`.
///
/// # Errors
///
/// - `InvalidImage` for zero original dimensions
/// - `Processing` for a non-square mask or a degenerate (zero-dimension)
///   content region
pub fn reconcile(
    mask: &RgbaImage,
    original_width: u32,
    original_height: u32,
) -> Result<RgbaImage> {
    let (mask_width, mask_height) = mask.dimensions();
    if mask_width != mask_height {
        return Err(SegmentationError::processing(format!(
            "Expected a square mask, got {mask_width}x{mask_height}"
        )));
    }

    let geometry = ResizeGeometry::compute(original_width, original_height, mask_width)?;
    if geometry.scaled_width == 0 || geometry.scaled_height == 0 {
        return Err(SegmentationError::processing(format!(
            "Degenerate content region {}x{} for {original_width}x{original_height} input",
            geometry.scaled_width, geometry.scaled_height
        )));
    }

    let crop = image::imageops::crop_imm(
        mask,
        geometry.offset_x,
        geometry.offset_y,
        geometry.scaled_width.min(mask_width),
        geometry.scaled_height.min(mask_height),
    )
    .to_image();

    rescale_to(&crop, original_width, original_height)
}

/// Scale `crop` to exactly `dest_width x dest_height`
fn rescale_to(crop: &RgbaImage, dest_width: u32, dest_height: u32) -> Result<RgbaImage> {
    let (crop_width, crop_height) = crop.dimensions();
    if dest_width == 0 || dest_height == 0 {
        return Err(SegmentationError::processing(
            "Destination dimensions must be non-zero",
        ));
    }

    if (crop_width, crop_height) == (dest_width, dest_height) {
        return Ok(crop.clone());
    }

    if crop_width < dest_width && crop_height < dest_height {
        // Overscale uniformly, then center-crop to the exact destination
        let factor =
            (dest_width as f32 / crop_width as f32).max(dest_height as f32 / crop_height as f32);
        let over_width = ((crop_width as f32 * factor).round() as u32).max(dest_width);
        let over_height = ((crop_height as f32 * factor).round() as u32).max(dest_height);

        let overscaled = image::imageops::resize(
            crop,
            over_width,
            over_height,
            image::imageops::FilterType::Triangle,
        );

        let offset_x = (over_width - dest_width) / 2;
        let offset_y = (over_height - dest_height) / 2;
        Ok(
            image::imageops::crop_imm(&overscaled, offset_x, offset_y, dest_width, dest_height)
                .to_image(),
        )
    } else {
        Ok(image::imageops::resize(
            crop,
            dest_width,
            dest_height,
            image::imageops::FilterType::Triangle,
        ))
    }
}
