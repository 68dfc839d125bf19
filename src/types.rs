//! Core result types for segmentation operations

use crate::config::ExecutionProvider;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Timing breakdown of one `execute` call, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTimings {
    /// Image resize, letterbox and tensor conversion
    pub preprocess_ms: u64,

    /// Forward pass
    pub inference_ms: u64,

    /// Mask decode and geometry reconciliation
    pub decode_ms: u64,

    /// Total end-to-end execution time
    pub total_ms: u64,
}

/// Format the multi-line execution report
///
/// Fixed fields: input size, execution provider, thread count, and the
/// per-stage durations.
#[must_use]
pub fn format_execution_log(
    input_size: usize,
    provider: ExecutionProvider,
    thread_count: usize,
    timings: &ExecutionTimings,
) -> String {
    let mut log = String::new();
    log.push_str(&format!("Input size: {input_size}x{input_size}\n"));
    log.push_str(&format!("Execution provider: {provider}\n"));
    log.push_str(&format!("Threads: {thread_count}\n"));
    log.push_str(&format!("Preprocess time: {} ms\n", timings.preprocess_ms));
    log.push_str(&format!("Inference time: {} ms\n", timings.inference_ms));
    log.push_str(&format!("Mask decode time: {} ms\n", timings.decode_ms));
    log.push_str(&format!("Total time: {} ms\n", timings.total_ms));
    log
}

/// Result of one segmentation execution
///
/// Constructed once per call and owned by the caller afterwards. The
/// composite and the scaled original are at the model's square resolution;
/// the mask is reconciled to the original image dimensions.
#[derive(Debug, Clone)]
pub struct ModelExecutionResult {
    /// Class colors composited over the scaled original
    pub composite: RgbaImage,

    /// The letterboxed original at model resolution
    pub scaled_original: RgbaImage,

    /// Binary target mask at the original image dimensions
    /// (black = target class, white = everything else)
    pub mask: RgbaImage,

    /// Human-readable execution report
    pub execution_log: String,

    /// Distinct arg-max classes observed across the frame
    pub classes_found: BTreeSet<usize>,
}

impl ModelExecutionResult {
    /// Aggregate the pipeline artifacts into one result
    #[must_use]
    pub fn new(
        composite: RgbaImage,
        scaled_original: RgbaImage,
        mask: RgbaImage,
        execution_log: String,
        classes_found: BTreeSet<usize>,
    ) -> Self {
        Self {
            composite,
            scaled_original,
            mask,
            execution_log,
            classes_found,
        }
    }

    /// Human-readable names of the found classes, in class-index order
    #[must_use]
    pub fn class_names(&self) -> Vec<&'static str> {
        self.classes_found
            .iter()
            .filter_map(|&c| crate::labels::label(c))
            .collect()
    }

    /// Foreground/background pixel statistics of the binary mask
    #[must_use]
    pub fn mask_statistics(&self) -> MaskStatistics {
        let (width, height) = self.mask.dimensions();
        let total_pixels = (width as usize) * (height as usize);
        // Foreground is black in this mask's polarity
        let foreground_pixels = self.mask.pixels().filter(|p| p[0] < 128).count();
        let background_pixels = total_pixels - foreground_pixels;

        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: if total_pixels == 0 {
                0.0
            } else {
                foreground_pixels as f32 / total_pixels as f32
            },
        }
    }
}

/// Statistics about a binary segmentation mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
}

/// Outcome of [`crate::ImageSegmenter::execute`](crate::ImageSegmenter::execute)
///
/// `execute` never fails once the segmenter is constructed: any pipeline
/// error is converted into `Degraded`, carrying blank placeholder bitmaps
/// and the failure reason. Both variants expose the same aggregate shape,
/// so a degraded run is distinguishable from a clean "no detections" run
/// without string-matching the log.
#[derive(Debug, Clone)]
pub enum SegmentationOutcome {
    /// The pipeline completed normally
    Completed(ModelExecutionResult),
    /// The pipeline failed; the result holds placeholder bitmaps and the
    /// error message in its log
    Degraded {
        result: ModelExecutionResult,
        reason: String,
    },
}

impl SegmentationOutcome {
    /// The result aggregate, regardless of outcome
    #[must_use]
    pub fn result(&self) -> &ModelExecutionResult {
        match self {
            Self::Completed(result) | Self::Degraded { result, .. } => result,
        }
    }

    /// Consume the outcome and take the result aggregate
    #[must_use]
    pub fn into_result(self) -> ModelExecutionResult {
        match self {
            Self::Completed(result) | Self::Degraded { result, .. } => result,
        }
    }

    /// Whether the pipeline failed and produced placeholder output
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The failure reason, when degraded
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn blank(size: u32) -> RgbaImage {
        ImageBuffer::new(size, size)
    }

    fn sample_result() -> ModelExecutionResult {
        ModelExecutionResult::new(
            blank(4),
            blank(4),
            blank(4),
            "log".to_string(),
            [0usize, 15].into_iter().collect(),
        )
    }

    #[test]
    fn test_execution_log_fields() {
        let timings = ExecutionTimings {
            preprocess_ms: 12,
            inference_ms: 345,
            decode_ms: 67,
            total_ms: 424,
        };
        let log = format_execution_log(257, ExecutionProvider::Cpu, 4, &timings);

        assert!(log.contains("Input size: 257x257"));
        assert!(log.contains("Execution provider: cpu"));
        assert!(log.contains("Threads: 4"));
        assert!(log.contains("Preprocess time: 12 ms"));
        assert!(log.contains("Inference time: 345 ms"));
        assert!(log.contains("Mask decode time: 67 ms"));
        assert!(log.contains("Total time: 424 ms"));
    }

    #[test]
    fn test_class_names_in_index_order() {
        let result = sample_result();
        assert_eq!(result.class_names(), vec!["background", "person"]);
    }

    #[test]
    fn test_mask_statistics() {
        let mut mask: RgbaImage = ImageBuffer::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        mask.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        let result = ModelExecutionResult::new(
            blank(2),
            blank(2),
            mask,
            String::new(),
            BTreeSet::new(),
        );

        let stats = result.mask_statistics();
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.foreground_pixels, 1);
        assert_eq!(stats.background_pixels, 3);
        assert!((stats.foreground_ratio - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_outcome_accessors() {
        let completed = SegmentationOutcome::Completed(sample_result());
        assert!(!completed.is_degraded());
        assert!(completed.reason().is_none());
        assert_eq!(completed.result().execution_log, "log");

        let degraded = SegmentationOutcome::Degraded {
            result: sample_result(),
            reason: "inference failed".to_string(),
        };
        assert!(degraded.is_degraded());
        assert_eq!(degraded.reason(), Some("inference failed"));
        assert_eq!(degraded.into_result().execution_log, "log");
    }
}
