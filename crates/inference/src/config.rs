#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl ExecutionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionProvider::Cpu => "cpu",
            ExecutionProvider::Cuda => "cuda",
        }
    }
}

impl TryFrom<String> for ExecutionProvider {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            other => Err(format!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            )),
        }
    }
}

/// Plain-data knobs for building the model session. Environment parsing
/// lives in the gateway; the core never reads ambient state.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: String,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
}

impl ModelConfig {
    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/model.onnx".to_string(),
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 4,
        }
    }
}
