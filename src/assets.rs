//! Model asset resolution and loading
//!
//! Model weights live as named files inside a read-only asset directory.
//! The store only resolves names to paths; bytes are read once at engine
//! construction and handed to the backend.

use crate::error::{Result, SegmentationError};
use crate::labels::NUM_CLASSES;
use std::fs;
use std::path::{Path, PathBuf};

/// Square edge length of the model's input canvas
pub const MODEL_INPUT_SIZE: usize = 257;

/// Mean subtracted from each raw 0-255 channel value during normalization
pub const IMAGE_MEAN: f32 = 128.0;

/// Divisor applied after mean subtraction during normalization
pub const IMAGE_STD: f32 = 128.0;

/// Model information and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub size_bytes: usize,
    /// NHWC input shape
    pub input_shape: (usize, usize, usize, usize),
    /// NHWC output shape (C = class scores)
    pub output_shape: (usize, usize, usize, usize),
}

impl ModelInfo {
    /// Fixed shape metadata of the DeepLab-v3 257 export
    #[must_use]
    pub fn deeplab(name: &str, size_bytes: usize) -> Self {
        Self {
            name: name.to_string(),
            size_bytes,
            input_shape: (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 3),
            output_shape: (1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, NUM_CLASSES),
        }
    }
}

/// Read-only store of named model assets
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Create a store rooted at `root`; existence is checked on resolve
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a named asset inside the store
    ///
    /// # Errors
    ///
    /// Returns `ModelLoad` if the asset does not exist.
    pub fn resolve(&self, name: &str) -> Result<ModelAsset> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(SegmentationError::model_load_with_context(
                "resolve model asset",
                &path,
                "no such file",
            ));
        }
        Ok(ModelAsset {
            name: name.to_string(),
            path,
        })
    }

    /// Store root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A resolved, readable model asset
#[derive(Debug, Clone)]
pub struct ModelAsset {
    name: String,
    path: PathBuf,
}

impl ModelAsset {
    /// Construct an asset from an explicit file path, bypassing the store
    #[must_use]
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    /// Asset name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asset file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the model bytes
    ///
    /// # Errors
    ///
    /// Returns `ModelLoad` on any read failure.
    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            SegmentationError::model_load_with_context("read model asset", &self.path, &e.to_string())
        })
    }

    /// Shape and size metadata for this asset
    ///
    /// # Errors
    ///
    /// Returns `ModelLoad` if the file cannot be inspected.
    pub fn info(&self) -> Result<ModelInfo> {
        let metadata = fs::metadata(&self.path).map_err(|e| {
            SegmentationError::model_load_with_context("stat model asset", &self.path, &e.to_string())
        })?;
        Ok(ModelInfo::deeplab(&self.name, metadata.len() as usize))
    }
}
