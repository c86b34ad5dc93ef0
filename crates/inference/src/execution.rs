use crate::backend::DetectionBackend;
use crate::error::DetectionError;
use crate::tensor::{ImageTensor, RawOutput};
use std::sync::Arc;
use std::time::Duration;

/// Execute the model against a prepared input off the async runtime.
///
/// The input tensor moves into the blocking task and is released there once
/// the model has consumed it. `deadline` bounds how long the caller waits; a
/// timed-out execution keeps running on its blocking thread (no cancellation),
/// the request just stops waiting for it.
pub async fn run_model(
    backend: Arc<dyn DetectionBackend>,
    tensor: ImageTensor,
    deadline: Option<Duration>,
) -> Result<RawOutput, DetectionError> {
    let task = tokio::task::spawn_blocking(move || backend.execute(&tensor));

    let joined = match deadline {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            DetectionError::Inference(format!(
                "inference timed out after {}ms",
                limit.as_millis()
            ))
        })?,
        None => task.await,
    };

    let raw = joined
        .map_err(|e| DetectionError::Inference(format!("inference task failed: {}", e)))??;

    // The decoder checks exact dimensions; the rank gate here catches models
    // whose declared output does not match the detection contract at all.
    if raw.ndim() != 3 {
        return Err(DetectionError::Inference(format!(
            "expected a rank-3 output tensor, got rank {}",
            raw.ndim()
        )));
    }

    Ok(raw)
}
