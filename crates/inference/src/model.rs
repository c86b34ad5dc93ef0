use crate::backend::DetectionBackend;
use crate::error::DetectionError;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[cfg(feature = "ort-backend")]
use crate::backend::ort::OrtBackend;
#[cfg(feature = "ort-backend")]
use crate::config::ModelConfig;

type BackendLoader =
    Arc<dyn Fn() -> Result<Arc<dyn DetectionBackend>, DetectionError> + Send + Sync>;

/// Owns the single model instance for the process lifetime.
///
/// The load is lazy and single-flight: concurrent first callers coalesce on
/// one load attempt, a failed load is not cached (the next caller retries),
/// and a successful load is permanent.
pub struct ModelManager {
    loader: BackendLoader,
    backend: OnceCell<Arc<dyn DetectionBackend>>,
}

impl ModelManager {
    #[cfg(feature = "ort-backend")]
    pub fn new(config: ModelConfig) -> Self {
        Self::with_loader(move || {
            OrtBackend::load(&config).map(|b| Arc::new(b) as Arc<dyn DetectionBackend>)
        })
    }

    /// Inject an arbitrary backend loader. This is the seam used by tests
    /// and by deployments that bring their own runtime.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn DetectionBackend>, DetectionError> + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            backend: OnceCell::new(),
        }
    }

    /// Return the loaded backend, loading it on first use. Safe to call on
    /// every request; the expensive load runs at most once concurrently.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn DetectionBackend>, DetectionError> {
        let backend = self
            .backend
            .get_or_try_init(|| async {
                tracing::info!("Loading detection model");
                let loader = Arc::clone(&self.loader);
                let loaded = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| {
                        DetectionError::ModelLoad(format!("model load task failed: {}", e))
                    })??;
                tracing::info!("Model loaded successfully");
                Ok::<_, DetectionError>(loaded)
            })
            .await?;

        Ok(Arc::clone(backend))
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.initialized()
    }
}
