use inference::{ExecutionProvider, ModelConfig};
use serde::Deserialize;
use std::time::Duration;

pub use common::{Environment, LogLevel};

#[derive(Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub model_path: String,
    pub execution_provider: String,
    pub intra_threads: usize,
    pub inference_timeout_ms: Option<u64>,
    pub max_upload_bytes: usize,
    pub preload_model: bool,
    pub log_level: LogLevel,
    pub environment: Environment,
}

impl Config {
    pub fn model_config(&self) -> anyhow::Result<ModelConfig> {
        let execution_provider = ExecutionProvider::try_from(self.execution_provider.clone())
            .map_err(anyhow::Error::msg)?;

        Ok(ModelConfig {
            model_path: self.model_path.clone(),
            execution_provider,
            intra_threads: self.intra_threads,
        })
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("listen_addr", "0.0.0.0:8080")?
        .set_default("model_path", "models/model.onnx")?
        .set_default("execution_provider", "cpu")?
        .set_default("intra_threads", 4)?
        .set_default("max_upload_bytes", 10 * 1024 * 1024)?
        .set_default("preload_model", false)?
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}
