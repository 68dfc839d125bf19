//! Raw output tensor decoding
//!
//! Interprets the `[1, H, W, C]` class-score tensor as a per-pixel label
//! map (arg-max, earliest index wins on ties) and reconstructs the three
//! per-pixel artifacts: a color composite over the scaled background, the
//! binary target mask, and the set of classes observed anywhere in the
//! frame.

use crate::error::{Result, SegmentationError};
use crate::palette::{composite_colors, ColorPalette};
use crate::preprocess::scale_and_letterbox;
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use ndarray::Array4;
use std::collections::BTreeSet;

const MASK_FOREGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const MASK_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Bitmaps and class set decoded from one output tensor
///
/// All bitmaps are at the tensor's `W x H` resolution, not the original
/// image size; see [`crate::geometry::reconcile`] for the final mask.
#[derive(Debug, Clone)]
pub struct DecodedMask {
    /// Class colors composited over the scaled background
    pub composite: RgbaImage,
    /// Binary target mask: black = target class, white = everything else
    pub mask: RgbaImage,
    /// Distinct arg-max classes observed across all pixels
    pub classes_found: BTreeSet<usize>,
}

/// Decoder for raw class-score tensors
pub struct MaskDecoder;

impl MaskDecoder {
    /// Decode an output tensor against a background image
    ///
    /// The background is brought to the tensor's resolution when needed.
    /// The palette is only read; decoding the same tensor twice yields
    /// bit-identical bitmaps.
    ///
    /// # Errors
    ///
    /// Returns `Processing` when the tensor shape or palette size does not
    /// match, or `InvalidImage` if the background cannot be scaled.
    pub fn decode(
        output: &Array4<f32>,
        background: &RgbaImage,
        palette: &ColorPalette,
        target_class: usize,
    ) -> Result<DecodedMask> {
        let (batch, height, width, classes) = output.dim();
        if batch != 1 {
            return Err(SegmentationError::processing(format!(
                "Expected batch size 1 in output tensor, got {batch}"
            )));
        }
        if classes != palette.len() {
            return Err(SegmentationError::processing(format!(
                "Output tensor has {classes} classes but palette has {}",
                palette.len()
            )));
        }

        let scaled_background = if background.dimensions() == (width as u32, height as u32) {
            background.clone()
        } else {
            scale_and_letterbox(
                &DynamicImage::ImageRgba8(background.clone()),
                width as u32,
            )?
        };

        let mut composite: RgbaImage = ImageBuffer::new(width as u32, height as u32);
        let mut mask: RgbaImage = ImageBuffer::new(width as u32, height as u32);
        let mut classes_found = BTreeSet::new();

        #[allow(clippy::indexing_slicing)]
        // Tensor dims validated above; pixel coordinates stay in bounds
        for y in 0..height {
            for x in 0..width {
                let mut max_score = 0.0f32;
                let mut winner = 0usize;
                for c in 0..classes {
                    let score = output[[0, y, x, c]];
                    // Strictly-greater keeps the earliest maximum on ties
                    if c == 0 || score > max_score {
                        max_score = score;
                        winner = c;
                    }
                }

                let is_target = winner == target_class;
                mask.put_pixel(
                    x as u32,
                    y as u32,
                    if is_target { MASK_FOREGROUND } else { MASK_BACKGROUND },
                );

                let overlay = palette.color(if is_target { target_class } else { 0 });
                let backdrop = *scaled_background.get_pixel(x as u32, y as u32);
                composite.put_pixel(x as u32, y as u32, composite_colors(overlay, backdrop));

                classes_found.insert(winner);
            }
        }

        Ok(DecodedMask {
            composite,
            mask,
            classes_found,
        })
    }
}
