//! Segmentation pipeline driver
//!
//! [`ImageSegmenter`] owns one inference backend and one color palette and
//! runs the full pipeline synchronously on the calling thread: preprocess,
//! forward pass, mask decode, geometry reconciliation, result assembly.
//! Construction acquires the engine (fatal on failure); `execute` never
//! fails afterwards, pipeline errors degrade into placeholder output.

use crate::{
    assets::{ModelAsset, IMAGE_MEAN, IMAGE_STD, MODEL_INPUT_SIZE},
    config::{BackendType, SegmenterConfig},
    decoder::MaskDecoder,
    error::Result,
    geometry,
    inference::InferenceBackend,
    palette::ColorPalette,
    preprocess,
    types::{format_execution_log, ExecutionTimings, ModelExecutionResult, SegmentationOutcome},
};
use image::{DynamicImage, GenericImageView, ImageBuffer, RgbaImage};
use instant::Instant;
use std::collections::BTreeSet;
use tracing::{instrument, span, warn, Level};

/// Factory trait for creating inference backends
///
/// Lets tests inject mock backends without model files or a runtime.
pub trait BackendFactory: Send + Sync {
    /// Create a backend instance of the specified type for a model asset
    ///
    /// # Errors
    ///
    /// Returns `SegmentationError` for unsupported backend types (e.g. a
    /// feature-gated backend that was compiled out).
    fn create_backend(
        &self,
        backend_type: BackendType,
        asset: ModelAsset,
    ) -> Result<Box<dyn InferenceBackend>>;

    /// List available backend types
    fn available_backends(&self) -> Vec<BackendType>;
}

/// Default backend factory backed by the compiled-in backends
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create_backend(
        &self,
        backend_type: BackendType,
        asset: ModelAsset,
    ) -> Result<Box<dyn InferenceBackend>> {
        match backend_type {
            BackendType::Onnx => {
                #[cfg(feature = "onnx")]
                {
                    Ok(Box::new(crate::backends::OnnxBackend::new(asset)))
                }
                #[cfg(not(feature = "onnx"))]
                {
                    let _ = asset;
                    Err(crate::error::SegmentationError::model_load(
                        "ONNX backend not compiled in (enable the `onnx` feature)",
                    ))
                }
            },
            BackendType::Tract => {
                #[cfg(feature = "tract")]
                {
                    Ok(Box::new(crate::backends::TractBackend::new(asset)))
                }
                #[cfg(not(feature = "tract"))]
                {
                    let _ = asset;
                    Err(crate::error::SegmentationError::model_load(
                        "Tract backend not compiled in (enable the `tract` feature)",
                    ))
                }
            },
        }
    }

    fn available_backends(&self) -> Vec<BackendType> {
        let mut backends = Vec::new();
        #[cfg(feature = "onnx")]
        backends.push(BackendType::Onnx);
        #[cfg(feature = "tract")]
        backends.push(BackendType::Tract);
        backends
    }
}

/// Synchronous segmentation pipeline over one loaded model
///
/// A segmenter is a stateful resource: `execute` takes `&mut self` and must
/// not be called concurrently. Construct one segmenter per worker for
/// parallel segmentation.
pub struct ImageSegmenter {
    config: SegmenterConfig,
    backend: Box<dyn InferenceBackend>,
    palette: ColorPalette,
}

impl ImageSegmenter {
    /// Create a segmenter with the default backend factory
    ///
    /// Loads the model and builds the engine; this is the only point where
    /// model or provider failures surface as hard errors.
    ///
    /// # Errors
    ///
    /// Returns `ModelLoad` for a missing/corrupt asset, session build
    /// failures, or an explicitly requested execution provider that is
    /// unavailable.
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        Self::with_factory(config, &DefaultBackendFactory)
    }

    /// Create a segmenter with a custom backend factory
    ///
    /// # Errors
    ///
    /// Propagates factory and backend initialization failures.
    pub fn with_factory(config: SegmenterConfig, factory: &dyn BackendFactory) -> Result<Self> {
        let asset = ModelAsset::from_path(config.asset_dir.join(&config.model_name));
        let mut backend = factory.create_backend(config.backend_type, asset)?;
        backend.initialize(&config)?;

        let seed = config.palette_seed.unwrap_or_else(clock_seed);
        let palette = ColorPalette::from_seed(seed);

        Ok(Self {
            config,
            backend,
            palette,
        })
    }

    /// Run the full segmentation pipeline over one image
    ///
    /// Never fails: every post-construction error is converted into
    /// [`SegmentationOutcome::Degraded`] with blank placeholder bitmaps,
    /// the error message in the execution log, and an empty class set.
    #[instrument(
        skip(self, image),
        fields(
            backend = ?self.config.backend_type,
            provider = %self.config.execution_provider,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub fn execute(&mut self, image: &DynamicImage) -> SegmentationOutcome {
        match self.run_pipeline(image) {
            Ok(result) => SegmentationOutcome::Completed(result),
            Err(err) => {
                warn!("Segmentation pipeline failed: {err}");
                let reason = err.to_string();
                SegmentationOutcome::Degraded {
                    result: Self::degraded_result(&reason),
                    reason,
                }
            },
        }
    }

    /// The configuration this segmenter was built with
    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// The palette used for compositing
    #[must_use]
    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Release the engine and any provider resources
    ///
    /// Consuming `self` makes double-close unrepresentable; engine and
    /// provider state are dropped together.
    pub fn close(self) {
        log::info!("Closing segmenter for model '{}'", self.config.model_name);
        drop(self.backend);
    }

    fn run_pipeline(&mut self, image: &DynamicImage) -> Result<ModelExecutionResult> {
        let total_start = Instant::now();
        let mut timings = ExecutionTimings::default();
        let size = MODEL_INPUT_SIZE as u32;
        let (original_width, original_height) = image.dimensions();

        let (scaled_original, input_tensor) = {
            let _span = span!(
                Level::DEBUG,
                "preprocessing",
                width = original_width,
                height = original_height
            )
            .entered();
            let stage_start = Instant::now();
            let scaled = preprocess::scale_and_letterbox(image, size)?;
            let tensor = preprocess::tensor_from_canvas(&scaled, IMAGE_MEAN, IMAGE_STD);
            timings.preprocess_ms = stage_start.elapsed().as_millis() as u64;
            (scaled, tensor)
        };

        let output = {
            let _span = span!(Level::INFO, "inference", backend = ?self.config.backend_type)
                .entered();
            let stage_start = Instant::now();
            let output = self.backend.infer(&input_tensor)?;
            timings.inference_ms = stage_start.elapsed().as_millis() as u64;
            output
        };

        let (decoded, mask) = {
            let _span = span!(Level::DEBUG, "mask_decode").entered();
            let stage_start = Instant::now();
            let decoded = MaskDecoder::decode(
                &output,
                &scaled_original,
                &self.palette,
                self.config.target_class,
            )?;
            let mask = geometry::reconcile(&decoded.mask, original_width, original_height)?;
            timings.decode_ms = stage_start.elapsed().as_millis() as u64;
            (decoded, mask)
        };

        timings.total_ms = total_start.elapsed().as_millis() as u64;
        let execution_log = format_execution_log(
            MODEL_INPUT_SIZE,
            self.config.execution_provider,
            self.config.thread_count,
            &timings,
        );

        Ok(ModelExecutionResult::new(
            decoded.composite,
            scaled_original,
            mask,
            execution_log,
            decoded.classes_found,
        ))
    }

    /// Placeholder result for a failed pipeline run
    fn degraded_result(reason: &str) -> ModelExecutionResult {
        let size = MODEL_INPUT_SIZE as u32;
        let blank: RgbaImage = ImageBuffer::new(size, size);
        ModelExecutionResult::new(
            blank.clone(),
            blank.clone(),
            blank,
            format!("Segmentation failed: {reason}\n"),
            BTreeSet::new(),
        )
    }
}

/// Palette seed derived from the system clock, one per segmenter instance
fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
