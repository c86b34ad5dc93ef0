use crate::error::DetectionError;
use crate::tensor::{ImageTensor, RawOutput};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// The black-box model boundary: a loaded detection model mapping one
/// preprocessed image to one raw output tensor. Implementations must be
/// callable from concurrent requests; execution never mutates weights.
pub trait DetectionBackend: Send + Sync {
    fn execute(&self, input: &ImageTensor) -> Result<RawOutput, DetectionError>;
}
