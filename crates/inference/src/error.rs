use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to load detection model: {0}")]
    ModelLoad(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output shape: expected {expected:?}, got {actual:?}")]
    OutputShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}
