use anyhow::Context;
use gateway::{config::get_configuration, logging::setup_logging, routes};
use inference::{DetectionPipeline, ModelManager};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration().context("failed to load configuration")?;
    setup_logging(&config);

    tracing::info!(
        listen_addr = %config.listen_addr,
        model_path = %config.model_path,
        execution_provider = %config.execution_provider,
        "Starting detection gateway"
    );

    let manager = Arc::new(ModelManager::new(config.model_config()?));

    if config.preload_model {
        match manager.ensure_loaded().await {
            Ok(_) => tracing::info!("Model preloaded"),
            Err(e) => {
                tracing::warn!(error = %e, "Model preload failed; requests will retry the load")
            }
        }
    }

    let pipeline = Arc::new(DetectionPipeline::new(manager, config.inference_timeout()));
    let app = routes::build_router(pipeline, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
