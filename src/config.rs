//! Configuration types for the segmentation pipeline

use crate::error::{Result, SegmentationError};
use crate::labels::{NUM_CLASSES, PERSON_CLASS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default name of the segmentation model asset
pub const DEFAULT_MODEL_NAME: &str = "deeplabv3_257_mv_gpu.onnx";

/// Default intra-op thread count hint passed to the inference engine
pub const DEFAULT_THREAD_COUNT: usize = 4;

/// Execution provider options for the inference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionProvider {
    /// CPU execution (always available)
    Cpu,
    /// Auto-detect best available accelerated provider (CUDA > `CoreML` > CPU)
    Auto,
    /// NVIDIA CUDA GPU acceleration
    Cuda,
    /// Apple Silicon GPU acceleration (Metal Performance Shaders)
    CoreMl,
}

impl ExecutionProvider {
    /// Whether this provider requests accelerated execution
    #[must_use]
    pub fn is_accelerated(self) -> bool {
        !matches!(self, Self::Cpu)
    }
}

impl Default for ExecutionProvider {
    fn default() -> Self {
        // Plain CPU execution unless acceleration is asked for explicitly
        Self::Cpu
    }
}

impl std::fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Auto => write!(f, "auto"),
            Self::Cuda => write!(f, "cuda"),
            Self::CoreMl => write!(f, "coreml"),
        }
    }
}

/// Backend type enumeration for runtime selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendType {
    /// ONNX Runtime backend (supports accelerated execution providers)
    Onnx,
    /// Tract backend (pure Rust, CPU only)
    Tract,
}

impl Default for BackendType {
    fn default() -> Self {
        Self::Onnx
    }
}

/// Configuration for an [`ImageSegmenter`](crate::ImageSegmenter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Directory holding read-only model assets
    pub asset_dir: PathBuf,

    /// Model asset name, resolved inside `asset_dir`
    pub model_name: String,

    /// Backend used for the forward pass
    pub backend_type: BackendType,

    /// Execution provider for the backend
    pub execution_provider: ExecutionProvider,

    /// Intra-op thread count hint for the engine (0 = auto)
    pub thread_count: usize,

    /// Class index isolated by the binary mask
    pub target_class: usize,

    /// Seed for the class color palette; `None` seeds from the system clock
    pub palette_seed: Option<u64>,
}

impl SegmenterConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> SegmenterConfigBuilder {
        SegmenterConfigBuilder::new()
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            backend_type: BackendType::default(),
            execution_provider: ExecutionProvider::default(),
            thread_count: DEFAULT_THREAD_COUNT,
            target_class: PERSON_CLASS,
            palette_seed: None,
        }
    }
}

/// Builder for [`SegmenterConfig`]
pub struct SegmenterConfigBuilder {
    config: SegmenterConfig,
}

impl SegmenterConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SegmenterConfig::default(),
        }
    }

    #[must_use]
    pub fn asset_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.asset_dir = dir.into();
        self
    }

    #[must_use]
    pub fn model_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.model_name = name.into();
        self
    }

    #[must_use]
    pub fn backend_type(mut self, backend_type: BackendType) -> Self {
        self.config.backend_type = backend_type;
        self
    }

    #[must_use]
    pub fn execution_provider(mut self, provider: ExecutionProvider) -> Self {
        self.config.execution_provider = provider;
        self
    }

    #[must_use]
    pub fn thread_count(mut self, threads: usize) -> Self {
        self.config.thread_count = threads;
        self
    }

    #[must_use]
    pub fn target_class(mut self, class: usize) -> Self {
        self.config.target_class = class;
        self
    }

    #[must_use]
    pub fn palette_seed(mut self, seed: u64) -> Self {
        self.config.palette_seed = Some(seed);
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `SegmentationError::Internal` for an out-of-range target
    /// class or an empty model name.
    pub fn build(self) -> Result<SegmenterConfig> {
        if self.config.target_class >= NUM_CLASSES {
            return Err(SegmentationError::internal(format!(
                "Target class {} out of range (0..{})",
                self.config.target_class, NUM_CLASSES
            )));
        }
        if self.config.model_name.is_empty() {
            return Err(SegmentationError::internal("Model name must not be empty"));
        }
        Ok(self.config)
    }
}

impl Default for SegmenterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
