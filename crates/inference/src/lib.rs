pub mod backend;
pub mod config;
pub mod decoding;
pub mod error;
pub mod execution;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod tensor;

// Re-export commonly used types for convenience
pub use backend::DetectionBackend;
pub use config::{ExecutionProvider, ModelConfig};
pub use decoding::DetectionSet;
pub use error::DetectionError;
pub use model::ModelManager;
pub use pipeline::DetectionPipeline;
pub use tensor::{ImageTensor, RawOutput};
