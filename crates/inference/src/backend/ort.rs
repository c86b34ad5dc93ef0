use super::DetectionBackend;
use crate::config::{ExecutionProvider, ModelConfig};
use crate::error::DetectionError;
use crate::tensor::{ImageTensor, RawOutput};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use parking_lot::Mutex;

fn load_err(e: ort::Error) -> DetectionError {
    DetectionError::ModelLoad(e.to_string())
}

fn infer_err(e: ort::Error) -> DetectionError {
    DetectionError::Inference(e.to_string())
}

pub struct OrtBackend {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OrtBackend {
    /// Build an ONNX Runtime session for the configured model artifact.
    pub fn load(config: &ModelConfig) -> Result<Self, DetectionError> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        #[allow(unused_mut)]
        let mut builder = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_err)?
            .with_intra_threads(config.intra_threads)
            .map_err(load_err)?;

        match config.execution_provider {
            #[cfg(feature = "cuda")]
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder
                    .with_execution_providers([
                        ort::execution_providers::CUDAExecutionProvider::default()
                            .with_device_id(0)
                            .build()
                            .error_on_failure(),
                    ])
                    .map_err(load_err)?;
            }
            #[cfg(not(feature = "cuda"))]
            ExecutionProvider::Cuda => {
                return Err(DetectionError::ModelLoad(
                    "CUDA execution provider requested but the `cuda` feature is not enabled"
                        .to_string(),
                ));
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder
            .commit_from_file(&config.model_path)
            .map_err(load_err)?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| DetectionError::ModelLoad("model declares no inputs".to_string()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| DetectionError::ModelLoad("model declares no outputs".to_string()))?;

        tracing::info!(
            model_path = %config.model_path,
            input = %input_name,
            output = %output_name,
            "Model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl DetectionBackend for OrtBackend {
    fn execute(&self, input: &ImageTensor) -> Result<RawOutput, DetectionError> {
        let input_value =
            TensorRef::from_array_view(input.view().into_dyn()).map_err(infer_err)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(infer_err)?;

        let raw = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(infer_err)?;

        Ok(RawOutput::new(raw.into_owned()))
    }
}
