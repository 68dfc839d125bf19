//! Inference backend abstraction

use crate::{config::SegmenterConfig, error::Result};
use ndarray::Array4;

// Use instant crate for cross-platform time compatibility
use instant::Duration;

/// Trait for inference backends
///
/// `infer` takes `&mut self`: a backend instance is a stateful resource and
/// must not be shared across concurrent callers. Use one backend (one
/// segmenter) per worker.
pub trait InferenceBackend {
    /// Initialize the backend with the given configuration
    ///
    /// Returns the model loading time on the first call, `None` when the
    /// backend is already initialized.
    ///
    /// # Errors
    /// - Model asset missing or unreadable
    /// - Engine/session construction failures
    /// - Explicitly requested execution provider unavailable
    fn initialize(&mut self, config: &SegmenterConfig) -> Result<Option<Duration>>;

    /// Run one forward pass over an NHWC input tensor
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Forward-pass failures surfaced by the engine
    /// - Output tensor shape or conversion errors
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Expected NHWC input shape
    fn input_shape(&self) -> (usize, usize, usize, usize);

    /// Expected NHWC output shape
    fn output_shape(&self) -> (usize, usize, usize, usize);

    /// Check if the backend is initialized
    fn is_initialized(&self) -> bool;
}
