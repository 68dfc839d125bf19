//! Tract backend for the segmentation model
//!
//! Pure Rust inference via Tract, mirroring the ONNX backend's contract
//! without external runtime dependencies. CPU only; the thread-count hint
//! and accelerated execution providers do not apply here.

use crate::assets::ModelAsset;
use crate::config::SegmenterConfig;
use crate::error::{Result, SegmentationError};
use crate::inference::InferenceBackend;
use ndarray::Array4;
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

// Use instant crate for cross-platform time compatibility
use instant::{Duration, Instant};

/// Tract backend for running the segmentation model using pure Rust inference
#[derive(Debug)]
pub struct TractBackend {
    model: Option<TractModel>,
    asset: ModelAsset,
    initialized: bool,
}

impl TractBackend {
    /// Create a new uninitialized backend for a resolved model asset
    #[must_use]
    pub fn new(asset: ModelAsset) -> Self {
        Self {
            model: None,
            asset,
            initialized: false,
        }
    }

    /// Load and optimize the model
    fn load_model(&mut self, _config: &SegmenterConfig) -> Result<Duration> {
        let model_load_start = Instant::now();

        let model_data = self.asset.load()?;
        let model_info = self.asset.info()?;

        log::info!(
            "🚀 Initializing Tract backend: {} ({:.2} MB, pure Rust)",
            model_info.name,
            model_info.size_bytes as f64 / (1024.0 * 1024.0)
        );

        let model = onnx()
            .model_for_read(&mut std::io::Cursor::new(model_data))
            .map_err(|e| SegmentationError::model_load(format!("Failed to load ONNX model: {e}")))?
            .into_optimized()
            .map_err(|e| SegmentationError::model_load(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| {
                SegmentationError::model_load(format!("Failed to create runnable model: {e}"))
            })?;

        self.model = Some(model);
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        log::info!(
            "✅ Tract backend initialized in {:.2}ms",
            model_load_time.as_millis()
        );

        Ok(model_load_time)
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(&mut self, config: &SegmenterConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }

        let model_load_time = self.load_model(config)?;
        Ok(Some(model_load_time))
    }

    #[allow(clippy::get_first)]
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| SegmentationError::inference("Tract model not initialized"))?;

        log::debug!("Running Tract inference, input shape {:?}", input.dim());
        let inference_start = Instant::now();

        let input_tensor = Tensor::from(input.clone());

        let outputs = model
            .run(tvec![input_tensor.into()])
            .map_err(|e| SegmentationError::inference(format!("Tract inference failed: {e}")))?;

        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| SegmentationError::inference("No output tensor found"))?
            .into_arc_tensor();

        let output_data = output_tensor.to_array_view::<f32>().map_err(|e| {
            SegmentationError::inference(format!("Failed to convert output tensor: {e}"))
        })?;

        let output_shape = output_data.shape();
        if output_shape.len() != 4 {
            return Err(SegmentationError::inference(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        }

        let output_array = Array4::from_shape_vec(
            (
                output_shape.get(0).copied().unwrap_or(1),
                output_shape.get(1).copied().unwrap_or(1),
                output_shape.get(2).copied().unwrap_or(1),
                output_shape.get(3).copied().unwrap_or(1),
            ),
            output_data.to_owned().into_raw_vec_and_offset().0,
        )
        .map_err(|e| {
            SegmentationError::inference(format!("Failed to reshape output tensor: {e}"))
        })?;

        log::debug!(
            "Tract inference complete in {:.2}ms",
            inference_start.elapsed().as_millis()
        );

        Ok(output_array)
    }

    fn input_shape(&self) -> (usize, usize, usize, usize) {
        self.asset
            .info()
            .map_or((1, 257, 257, 3), |info| info.input_shape)
    }

    fn output_shape(&self) -> (usize, usize, usize, usize) {
        self.asset
            .info()
            .map_or((1, 257, 257, 21), |info| info.output_shape)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_starts_uninitialized() {
        let backend = TractBackend::new(ModelAsset::from_path("/nonexistent/model.onnx"));
        assert!(!backend.is_initialized());
        assert_eq!(backend.input_shape(), (1, 257, 257, 3));
        assert_eq!(backend.output_shape(), (1, 257, 257, 21));
    }

    #[test]
    fn test_initialize_fails_for_missing_asset() {
        let mut backend = TractBackend::new(ModelAsset::from_path("/nonexistent/model.onnx"));
        let result = backend.initialize(&SegmenterConfig::default());
        assert!(matches!(result, Err(SegmentationError::ModelLoad(_))));
        assert!(!backend.is_initialized());
    }
}
