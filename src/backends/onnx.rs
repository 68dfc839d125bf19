//! ONNX Runtime backend for the segmentation model
//!
//! Implements the [`InferenceBackend`] trait using ONNX Runtime with support
//! for CPU, CUDA and CoreML execution providers. An explicitly requested
//! accelerated provider that is unavailable is a fatal construction error;
//! only `Auto` falls back silently.

use crate::assets::ModelAsset;
use crate::config::{ExecutionProvider, SegmenterConfig};
use crate::error::{Result, SegmentationError};
use crate::inference::InferenceBackend;
use ndarray::Array4;
use ort::execution_providers::{
    CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider as OrtExecutionProvider,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;

/// ONNX Runtime backend for running the segmentation model
#[derive(Debug)]
pub struct OnnxBackend {
    session: Option<Session>,
    asset: ModelAsset,
    initialized: bool,
}

impl OnnxBackend {
    /// Create a new uninitialized backend for a resolved model asset
    #[must_use]
    pub fn new(asset: ModelAsset) -> Self {
        Self {
            session: None,
            asset,
            initialized: false,
        }
    }

    /// Load the model and build the ONNX Runtime session
    fn load_model(&mut self, config: &SegmenterConfig) -> Result<std::time::Duration> {
        let model_load_start = std::time::Instant::now();

        let model_data = self.asset.load()?;
        let model_info = self.asset.info()?;

        log::info!(
            "🚀 Initializing ONNX backend: {} ({:.2} MB)",
            model_info.name,
            model_info.size_bytes as f64 / (1024.0 * 1024.0)
        );

        let mut session_builder = Session::builder()
            .map_err(|e| {
                SegmentationError::model_load(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                SegmentationError::model_load(format!("Failed to set optimization level: {e}"))
            })?;

        session_builder = Self::configure_provider(session_builder, config.execution_provider)?;

        let intra_threads = if config.thread_count > 0 {
            config.thread_count
        } else {
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(4)
        };

        let session = session_builder
            .with_intra_threads(intra_threads)
            .map_err(|e| SegmentationError::model_load(format!("Failed to set intra threads: {e}")))?
            .commit_from_memory(&model_data)
            .map_err(|e| {
                SegmentationError::model_load_with_context(
                    "build session from model asset",
                    self.asset.path(),
                    &e.to_string(),
                )
            })?;

        log::debug!(
            "Session ready: provider={}, intra threads={intra_threads}",
            config.execution_provider
        );

        self.session = Some(session);
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        log::info!(
            "✅ Model loading complete: {:.0}ms",
            model_load_time.as_secs_f64() * 1000.0
        );

        Ok(model_load_time)
    }

    /// Apply the configured execution provider to the session builder
    ///
    /// `Auto` probes CUDA then CoreML and falls back to CPU silently. An
    /// explicit accelerated provider that is unavailable or fails to
    /// register propagates as `ModelLoad`.
    fn configure_provider(
        session_builder: ort::session::builder::SessionBuilder,
        provider: ExecutionProvider,
    ) -> Result<ort::session::builder::SessionBuilder> {
        match provider {
            ExecutionProvider::Cpu => {
                log::info!("Using CPU execution provider");
                Ok(session_builder)
            },
            ExecutionProvider::Auto => {
                let mut providers = Vec::new();

                let cuda_provider = CUDAExecutionProvider::default();
                if OrtExecutionProvider::is_available(&cuda_provider).unwrap_or(false) {
                    log::info!("CUDA execution provider is available and will be used");
                    providers.push(cuda_provider.build());
                }

                let coreml_provider = CoreMLExecutionProvider::default();
                if OrtExecutionProvider::is_available(&coreml_provider).unwrap_or(false) {
                    log::info!("CoreML execution provider is available and will be used");
                    providers.push(coreml_provider.build());
                }

                if providers.is_empty() {
                    log::info!("No accelerated provider available, using CPU");
                    Ok(session_builder)
                } else {
                    session_builder
                        .with_execution_providers(providers)
                        .map_err(|e| {
                            SegmentationError::model_load(format!(
                                "Failed to set auto execution providers: {e}"
                            ))
                        })
                }
            },
            ExecutionProvider::Cuda => {
                let cuda_provider = CUDAExecutionProvider::default();
                if !OrtExecutionProvider::is_available(&cuda_provider).unwrap_or(false) {
                    return Err(SegmentationError::model_load(
                        "CUDA execution provider requested but not available",
                    ));
                }
                log::info!("Using CUDA execution provider");
                session_builder
                    .with_execution_providers([cuda_provider.build()])
                    .map_err(|e| {
                        SegmentationError::model_load(format!(
                            "Failed to set CUDA execution provider: {e}"
                        ))
                    })
            },
            ExecutionProvider::CoreMl => {
                let coreml_provider = CoreMLExecutionProvider::default();
                if !OrtExecutionProvider::is_available(&coreml_provider).unwrap_or(false) {
                    return Err(SegmentationError::model_load(
                        "CoreML execution provider requested but not available",
                    ));
                }
                log::info!("Using CoreML execution provider");
                session_builder
                    .with_execution_providers([CoreMLExecutionProvider::default()
                        .with_subgraphs(true)
                        .build()])
                    .map_err(|e| {
                        SegmentationError::model_load(format!(
                            "Failed to set CoreML execution provider: {e}"
                        ))
                    })
            },
        }
    }
}

impl InferenceBackend for OnnxBackend {
    fn initialize(&mut self, config: &SegmenterConfig) -> Result<Option<std::time::Duration>> {
        if self.initialized {
            return Ok(None);
        }

        let model_load_time = self.load_model(config)?;
        Ok(Some(model_load_time))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| SegmentationError::internal("ONNX session not initialized"))?;

        log::debug!("Running ONNX inference, input shape {:?}", input.dim());
        let inference_start = std::time::Instant::now();

        let input_value = Value::from_array(input.clone()).map_err(|e| {
            SegmentationError::inference(format!("Failed to convert input tensor: {e}"))
        })?;

        // Positional inputs/outputs; the export has a single one of each
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| SegmentationError::inference(format!("ONNX inference failed: {e}")))?;

        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys
            .first()
            .ok_or_else(|| SegmentationError::inference("No output tensors found"))?;
        let output_tensor = outputs
            .get(first_key)
            .ok_or_else(|| SegmentationError::inference("First output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| {
                SegmentationError::inference(format!("Failed to extract output tensor: {e}"))
            })?;

        let output_shape = output_tensor.shape().to_vec();
        if output_shape.len() != 4 {
            return Err(SegmentationError::inference(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        }

        let output_data = output_tensor.view().to_owned();
        let output_array = Array4::from_shape_vec(
            (
                output_shape.first().copied().unwrap_or(1),
                output_shape.get(1).copied().unwrap_or(1),
                output_shape.get(2).copied().unwrap_or(1),
                output_shape.get(3).copied().unwrap_or(1),
            ),
            output_data.into_raw_vec_and_offset().0,
        )
        .map_err(|e| {
            SegmentationError::inference(format!("Failed to reshape output tensor: {e}"))
        })?;

        log::debug!(
            "Inference complete in {:.2}ms, output shape {:?}",
            inference_start.elapsed().as_secs_f64() * 1000.0,
            output_array.dim()
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
        let backend = OnnxBackend::new(ModelAsset::from_path("/nonexistent/model.onnx"));
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_initialize_fails_for_missing_asset() {
        let mut backend = OnnxBackend::new(ModelAsset::from_path("/nonexistent/model.onnx"));
        let config = SegmenterConfig::default();
        let result = backend.initialize(&config);
        assert!(matches!(result, Err(SegmentationError::ModelLoad(_))));
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_infer_requires_initialization() {
        let mut backend = OnnxBackend::new(ModelAsset::from_path("/nonexistent/model.onnx"));
        let input = Array4::<f32>::zeros((1, 257, 257, 3));
        assert!(backend.infer(&input).is_err());
    }
}
