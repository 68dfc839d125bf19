//! Image-to-tensor preprocessing
//!
//! Converts an arbitrary input image into the model's square NHWC float
//! tensor: aspect-preserving resize, centered letterbox onto a black
//! canvas, then per-channel normalization. The letterboxed (un-normalized)
//! bitmap is reused by the mask decoder as the compositing background, and
//! [`ResizeGeometry`] is the single source of truth shared with the inverse
//! transform in [`crate::geometry`].

use crate::error::{Result, SegmentationError};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use ndarray::Array4;

/// Forward letterbox geometry for one input image
///
/// `scaled_width`/`scaled_height` are the content dimensions inside the
/// square canvas; the rest of the canvas is padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeGeometry {
    /// Uniform scale factor `target / max(width, height)`
    pub ratio: f32,
    /// Content width after scaling
    pub scaled_width: u32,
    /// Content height after scaling
    pub scaled_height: u32,
    /// Horizontal centering offset of the content region
    pub offset_x: u32,
    /// Vertical centering offset of the content region
    pub offset_y: u32,
    /// Square canvas edge length
    pub target: u32,
}

impl ResizeGeometry {
    /// Compute the letterbox geometry for a `width x height` input
    ///
    /// # Errors
    ///
    /// Returns `InvalidImage` for a zero-dimension input.
    pub fn compute(width: u32, height: u32, target: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SegmentationError::invalid_image(format!(
                "Input image has zero dimension ({width}x{height})"
            )));
        }

        let ratio = target as f32 / width.max(height) as f32;
        let scaled_width = (width as f32 * ratio).round() as u32;
        let scaled_height = (height as f32 * ratio).round() as u32;

        Ok(Self {
            ratio,
            scaled_width,
            scaled_height,
            offset_x: (target - scaled_width.min(target)) / 2,
            offset_y: (target - scaled_height.min(target)) / 2,
            target,
        })
    }
}

/// Resize `image` to fit a `target x target` square, preserving aspect
/// ratio, and center it on an opaque black canvas
///
/// The input is never mutated. Also used to bring the compositing
/// background to model resolution.
///
/// # Errors
///
/// Returns `InvalidImage` for a zero-dimension input.
pub fn scale_and_letterbox(image: &DynamicImage, target: u32) -> Result<RgbaImage> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let geometry = ResizeGeometry::compute(width, height, target)?;
    if geometry.scaled_width == 0 || geometry.scaled_height == 0 {
        return Err(SegmentationError::invalid_image(format!(
            "Content collapses to {}x{} at target size {target}",
            geometry.scaled_width, geometry.scaled_height
        )));
    }

    let resized = image::imageops::resize(
        &rgba,
        geometry.scaled_width,
        geometry.scaled_height,
        image::imageops::FilterType::Triangle,
    );

    let mut canvas: RgbaImage = ImageBuffer::from_pixel(target, target, Rgba([0, 0, 0, 255]));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let canvas_x = x + geometry.offset_x;
        let canvas_y = y + geometry.offset_y;
        if canvas_x < target && canvas_y < target {
            canvas.put_pixel(canvas_x, canvas_y, *pixel);
        }
    }

    Ok(canvas)
}

/// Convert a letterboxed square canvas into a normalized NHWC tensor
///
/// Each RGB channel value is mapped as `(raw - mean) / std` on the raw
/// 0-255 value. Output shape is `[1, S, S, 3]`.
#[must_use]
pub fn tensor_from_canvas(canvas: &RgbaImage, mean: f32, std: f32) -> Array4<f32> {
    let (width, height) = canvas.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));

    #[allow(clippy::indexing_slicing)]
    // Tensor dimensions are pre-allocated to match the canvas size
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, y, x, 0]] = (f32::from(pixel[0]) - mean) / std;
        tensor[[0, y, x, 1]] = (f32::from(pixel[1]) - mean) / std;
        tensor[[0, y, x, 2]] = (f32::from(pixel[2]) - mean) / std;
    }

    tensor
}

/// Letterbox and normalize `image` into the model input tensor
///
/// # Errors
///
/// Returns `InvalidImage` for a zero-dimension input.
pub fn image_to_tensor(
    image: &DynamicImage,
    target: u32,
    mean: f32,
    std: f32,
) -> Result<Array4<f32>> {
    let canvas = scale_and_letterbox(image, target)?;
    Ok(tensor_from_canvas(&canvas, mean, std))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{IMAGE_MEAN, IMAGE_STD, MODEL_INPUT_SIZE};
    use image::Rgb;

    const S: u32 = MODEL_INPUT_SIZE as u32;

    fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, color))
    }

    #[test]
    fn test_square_input_has_identity_ratio() {
        let geometry = ResizeGeometry::compute(S, S, S).unwrap();
        assert!((geometry.ratio - 1.0).abs() < f32::EPSILON);
        assert_eq!(geometry.scaled_width, S);
        assert_eq!(geometry.scaled_height, S);
        assert_eq!((geometry.offset_x, geometry.offset_y), (0, 0));
    }

    #[test]
    fn test_landscape_geometry() {
        // 400x300 at S=257: ratio 0.6425, content 257x193, centered vertically
        let geometry = ResizeGeometry::compute(400, 300, S).unwrap();
        assert!((geometry.ratio - 0.6425).abs() < 1e-6);
        assert_eq!(geometry.scaled_width, 257);
        assert_eq!(geometry.scaled_height, 193);
        assert_eq!(geometry.offset_x, 0);
        assert_eq!(geometry.offset_y, 32);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let result = ResizeGeometry::compute(0, 300, S);
        assert!(matches!(result, Err(SegmentationError::InvalidImage(_))));
    }

    #[test]
    fn test_letterbox_dimensions_and_padding() {
        let image = solid_image(400, 300, Rgb([255, 0, 0]));
        let canvas = scale_and_letterbox(&image, S).unwrap();
        assert_eq!(canvas.dimensions(), (S, S));

        // Top rows are padding, the vertical center is content
        assert_eq!(*canvas.get_pixel(128, 0), Rgba([0, 0, 0, 255]));
        let center = *canvas.get_pixel(128, 128);
        assert_eq!(center[0], 255);
        assert_eq!(center[1], 0);
    }

    #[test]
    fn test_letterbox_does_not_mutate_input() {
        let image = solid_image(400, 300, Rgb([9, 9, 9]));
        let before = image.to_rgba8();
        let _ = scale_and_letterbox(&image, S).unwrap();
        assert_eq!(image.to_rgba8(), before);
    }

    #[test]
    fn test_tensor_shape_and_length() {
        let image = solid_image(64, 64, Rgb([128, 128, 128]));
        let tensor = image_to_tensor(&image, S, IMAGE_MEAN, IMAGE_STD).unwrap();
        assert_eq!(tensor.shape(), &[1, S as usize, S as usize, 3]);
        assert_eq!(tensor.len(), S as usize * S as usize * 3);
    }

    #[test]
    fn test_normalization_range() {
        // Black padding maps to -1.0, white content to just under 1.0
        let image = solid_image(400, 300, Rgb([255, 255, 255]));
        let tensor = image_to_tensor(&image, S, IMAGE_MEAN, IMAGE_STD).unwrap();

        let padding = tensor[[0, 0, 128, 0]];
        assert!((padding - (-1.0)).abs() < f32::EPSILON);

        let content = tensor[[0, 128, 128, 0]];
        assert!((content - (255.0 - 128.0) / 128.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_dimension_tensor_rejected() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::new(0, 10));
        let result = image_to_tensor(&image, S, IMAGE_MEAN, IMAGE_STD);
        assert!(matches!(result, Err(SegmentationError::InvalidImage(_))));
    }
}
