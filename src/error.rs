//! Error types for segmentation operations

use thiserror::Error;

/// Result type alias for segmentation operations
pub type Result<T> = std::result::Result<T, SegmentationError>;

/// Error types for segmentation operations
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// Input/output errors (asset not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format or buffer errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Model asset loading or engine construction errors; fatal at construction
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Zero-dimension or otherwise malformed input image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Failures during the forward pass
    #[error("Inference error: {0}")]
    Inference(String),

    /// Failures during mask decode or geometry reconstruction
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SegmentationError {
    /// Create a new model load error
    pub fn model_load<S: Into<String>>(msg: S) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a model load error with the asset path and a hint for the operator
    pub fn model_load_with_context<P: AsRef<std::path::Path>>(
        operation: &str,
        asset_path: P,
        error: &str,
    ) -> Self {
        Self::ModelLoad(format!(
            "Failed to {} '{}': {}",
            operation,
            asset_path.as_ref().display(),
            error
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = SegmentationError::invalid_image("zero width");
        assert!(matches!(err, SegmentationError::InvalidImage(_)));

        let err = SegmentationError::model_load("asset missing");
        assert!(matches!(err, SegmentationError::ModelLoad(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SegmentationError::inference("tensor shape mismatch");
        assert_eq!(err.to_string(), "Inference error: tensor shape mismatch");
    }

    #[test]
    fn test_model_load_context() {
        let err = SegmentationError::model_load_with_context(
            "read model asset",
            Path::new("/assets/deeplab.onnx"),
            "file not found",
        );
        let message = err.to_string();
        assert!(message.contains("read model asset"));
        assert!(message.contains("/assets/deeplab.onnx"));
        assert!(message.contains("file not found"));
    }
}
