#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # segmask
//!
//! Person segmentation and mask reconstruction using the DeepLab-v3 257
//! model, with ONNX Runtime and Tract inference backends.
//!
//! The library takes an in-memory image of arbitrary size, runs the
//! fixed-topology segmentation model over it, and reconstructs three
//! aligned bitmaps: a color composite of the detected classes over the
//! scaled input, a binary person/background mask brought back to the
//! original image's resolution, and the set of classes discovered in the
//! frame. Camera capture, UI, and photo persistence are the caller's
//! concern.
//!
//! ## Features
//!
//! - **Two backends**: ONNX Runtime (accelerated execution providers) and
//!   Tract (pure Rust), selected at runtime
//! - **Exact geometry round-trip**: the letterbox applied during
//!   preprocessing is inverted pixel-for-pixel for the final mask
//! - **Deterministic palettes**: class overlay colors come from a seeded
//!   factory, so composites are reproducible under test
//! - **Degraded-success semantics**: once constructed, `execute` never
//!   fails; pipeline errors produce placeholder output with an explicit
//!   reason
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segmask::{ImageSegmenter, SegmenterConfig, ExecutionProvider};
//!
//! # fn example() -> segmask::Result<()> {
//! let config = SegmenterConfig::builder()
//!     .asset_dir("assets")
//!     .execution_provider(ExecutionProvider::Cpu)
//!     .build()?;
//! let mut segmenter = ImageSegmenter::new(config)?;
//!
//! let image = image::open("photo.jpg")?;
//! let outcome = segmenter.execute(&image);
//! if outcome.is_degraded() {
//!     eprintln!("degraded: {:?}", outcome.reason());
//! }
//! let result = outcome.into_result();
//! result.mask.save("mask.png")?;
//!
//! segmenter.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Backend Selection
//!
//! The default configuration uses the ONNX Runtime backend on CPU. Pass
//! [`config::BackendType::Tract`] for the pure Rust backend, or an
//! accelerated [`ExecutionProvider`] for GPU execution. An explicitly
//! requested provider that is unavailable fails construction instead of
//! silently falling back.

pub mod assets;
pub mod backends;
pub mod config;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod inference;
pub mod labels;
pub mod palette;
pub mod portrait;
pub mod preprocess;
pub mod segmenter;
pub mod types;

// Public API exports
pub use assets::{AssetStore, ModelAsset, ModelInfo, IMAGE_MEAN, IMAGE_STD, MODEL_INPUT_SIZE};
pub use config::{
    BackendType, ExecutionProvider, SegmenterConfig, SegmenterConfigBuilder, DEFAULT_MODEL_NAME,
    DEFAULT_THREAD_COUNT,
};
pub use decoder::{DecodedMask, MaskDecoder};
pub use error::{Result, SegmentationError};
pub use geometry::reconcile;
pub use inference::InferenceBackend;
pub use labels::{label, LABELS, NUM_CLASSES, PERSON_CLASS};
pub use palette::{composite_colors, ColorPalette};
pub use portrait::apply_portrait_effect;
pub use preprocess::{image_to_tensor, scale_and_letterbox, ResizeGeometry};
pub use segmenter::{BackendFactory, DefaultBackendFactory, ImageSegmenter};
pub use types::{
    format_execution_log, ExecutionTimings, MaskStatistics, ModelExecutionResult,
    SegmentationOutcome,
};

/// Segment a single image with a one-off segmenter
///
/// Convenience wrapper for callers that do not reuse the engine: builds a
/// segmenter from `config`, runs one execution, and releases the engine.
/// Construction errors (`ModelLoad`) propagate; pipeline errors surface as
/// a degraded outcome, matching [`ImageSegmenter::execute`].
pub fn segment_image(
    image: &image::DynamicImage,
    config: SegmenterConfig,
) -> Result<SegmentationOutcome> {
    let mut segmenter = ImageSegmenter::new(config)?;
    let outcome = segmenter.execute(image);
    segmenter.close();
    Ok(outcome)
}
