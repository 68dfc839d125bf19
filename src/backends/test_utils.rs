//! Test utilities and mock backends
//!
//! Mock implementations of the [`InferenceBackend`] trait so the pipeline
//! can be exercised without model files or an inference runtime.

use crate::{
    assets::MODEL_INPUT_SIZE,
    config::SegmenterConfig,
    error::{Result, SegmentationError},
    inference::InferenceBackend,
    labels::{NUM_CLASSES, PERSON_CLASS},
};
use instant::Duration;
use ndarray::Array4;
use std::sync::{Arc, Mutex};

/// Mock backend emitting a deterministic class-score tensor
///
/// When the center pixel of the input is brighter than the normalization
/// midpoint, the center third of the output scores as "person"; otherwise
/// every pixel scores as background. This makes the output depend on the
/// input, so buffer-reuse bugs across sequential calls become visible.
#[derive(Debug, Clone)]
pub struct MockSegmentationBackend {
    initialized: bool,
    call_history: Arc<Mutex<Vec<String>>>,
    should_fail_init: bool,
    should_fail_inference: bool,
}

impl MockSegmentationBackend {
    /// Create a new mock backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: false,
            call_history: Arc::new(Mutex::new(Vec::new())),
            should_fail_init: false,
            should_fail_inference: false,
        }
    }

    /// Create a mock backend that fails during initialization
    #[must_use]
    pub fn new_failing_init() -> Self {
        let mut backend = Self::new();
        backend.should_fail_init = true;
        backend
    }

    /// Create a mock backend that fails during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        let mut backend = Self::new();
        backend.should_fail_inference = true;
        backend
    }

    /// Get the call history for verification in tests
    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    fn record_call(&self, method: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(method.to_string());
        }
    }

    fn generate_mock_output(input: &Array4<f32>) -> Array4<f32> {
        let size = MODEL_INPUT_SIZE;
        let mut output = Array4::<f32>::zeros((1, size, size, NUM_CLASSES));

        let center = input
            .get([0, size / 2, size / 2, 0])
            .copied()
            .unwrap_or(-1.0);
        let person_visible = center > 0.0;

        let lo = size / 3;
        let hi = 2 * size / 3;
        for y in 0..size {
            for x in 0..size {
                let class = if person_visible && (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                    PERSON_CLASS
                } else {
                    0
                };
                output[[0, y, x, class]] = 1.0;
            }
        }

        output
    }
}

impl Default for MockSegmentationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockSegmentationBackend {
    fn initialize(&mut self, _config: &SegmenterConfig) -> Result<Option<Duration>> {
        self.record_call("initialize");

        if self.should_fail_init {
            return Err(SegmentationError::model_load(
                "Mock backend initialization failed",
            ));
        }

        self.initialized = true;
        Ok(Some(Duration::from_millis(10)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        self.record_call("infer");

        if !self.initialized {
            return Err(SegmentationError::internal("Mock backend not initialized"));
        }

        if self.should_fail_inference {
            return Err(SegmentationError::inference("Mock inference failed"));
        }

        Ok(Self::generate_mock_output(input))
    }

    fn input_shape(&self) -> (usize, usize, usize, usize) {
        (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3)
    }

    fn output_shape(&self) -> (usize, usize, usize, usize) {
        (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, NUM_CLASSES)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Test factory producing mock backends
#[derive(Debug, Default)]
pub struct MockBackendFactory {
    /// Produce backends that fail initialization
    pub create_failing_backends: bool,
    /// Produce backends that fail during inference
    pub create_failing_inference: bool,
}

impl MockBackendFactory {
    /// Factory producing healthy mock backends
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory producing backends that fail to initialize
    #[must_use]
    pub fn new_failing_init() -> Self {
        Self {
            create_failing_backends: true,
            create_failing_inference: false,
        }
    }

    /// Factory producing backends that fail during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        Self {
            create_failing_backends: false,
            create_failing_inference: true,
        }
    }
}

impl crate::segmenter::BackendFactory for MockBackendFactory {
    fn create_backend(
        &self,
        _backend_type: crate::config::BackendType,
        _asset: crate::assets::ModelAsset,
    ) -> Result<Box<dyn InferenceBackend>> {
        if self.create_failing_backends {
            Ok(Box::new(MockSegmentationBackend::new_failing_init()))
        } else if self.create_failing_inference {
            Ok(Box::new(MockSegmentationBackend::new_failing_inference()))
        } else {
            Ok(Box::new(MockSegmentationBackend::new()))
        }
    }

    fn available_backends(&self) -> Vec<crate::config::BackendType> {
        vec![crate::config::BackendType::Onnx, crate::config::BackendType::Tract]
    }
}

/// Helper functions for creating test images
pub mod test_helpers {
    use image::{DynamicImage, ImageBuffer, Rgb};

    /// Create a solid-gray test image with the given brightness
    pub fn create_test_image(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([value; 3])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{IMAGE_MEAN, IMAGE_STD};
    use crate::preprocess::image_to_tensor;

    #[test]
    fn test_mock_backend_lifecycle() {
        let mut backend = MockSegmentationBackend::new();
        assert!(!backend.is_initialized());

        backend.initialize(&SegmenterConfig::default()).unwrap();
        assert!(backend.is_initialized());
        assert_eq!(backend.call_history(), vec!["initialize"]);
    }

    #[test]
    fn test_mock_output_depends_on_input() {
        let mut backend = MockSegmentationBackend::new();
        backend.initialize(&SegmenterConfig::default()).unwrap();

        let size = MODEL_INPUT_SIZE as u32;
        let bright = image_to_tensor(
            &test_helpers::create_test_image(size, size, 255),
            size,
            IMAGE_MEAN,
            IMAGE_STD,
        )
        .unwrap();
        let dark = image_to_tensor(
            &test_helpers::create_test_image(size, size, 0),
            size,
            IMAGE_MEAN,
            IMAGE_STD,
        )
        .unwrap();

        let bright_out = backend.infer(&bright).unwrap();
        let dark_out = backend.infer(&dark).unwrap();

        let mid = MODEL_INPUT_SIZE / 2;
        assert!(bright_out[[0, mid, mid, PERSON_CLASS]] > 0.0);
        assert!((dark_out[[0, mid, mid, PERSON_CLASS]]).abs() < f32::EPSILON);
        assert!(dark_out[[0, mid, mid, 0]] > 0.0);
    }

    #[test]
    fn test_mock_failure_modes() {
        let mut failing_init = MockSegmentationBackend::new_failing_init();
        assert!(failing_init.initialize(&SegmenterConfig::default()).is_err());

        let mut failing_inference = MockSegmentationBackend::new_failing_inference();
        failing_inference
            .initialize(&SegmenterConfig::default())
            .unwrap();
        let input = Array4::<f32>::zeros((1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3));
        assert!(failing_inference.infer(&input).is_err());
    }
}
