use crate::decoding::{self, DetectionSet};
use crate::error::DetectionError;
use crate::execution;
use crate::model::ModelManager;
use crate::preprocessing;
use std::sync::Arc;
use std::time::Duration;

/// Per-request orchestration: ensure the model is loaded, preprocess, run,
/// decode. Every intermediate tensor is owned by exactly one stage and is
/// dropped on every exit path, success or failure.
pub struct DetectionPipeline {
    manager: Arc<ModelManager>,
    inference_timeout: Option<Duration>,
}

impl DetectionPipeline {
    pub fn new(manager: Arc<ModelManager>, inference_timeout: Option<Duration>) -> Self {
        Self {
            manager,
            inference_timeout,
        }
    }

    /// Run one detection request end to end. Returns typed errors only;
    /// nothing panics across this boundary.
    pub async fn detect(&self, image: Vec<u8>) -> Result<DetectionSet, DetectionError> {
        let backend = self.manager.ensure_loaded().await?;

        let tensor = tokio::task::spawn_blocking(move || preprocessing::prepare_image(&image))
            .await
            .map_err(|e| {
                DetectionError::ImageDecode(format!("preprocessing task failed: {}", e))
            })??;

        let raw = execution::run_model(backend, tensor, self.inference_timeout).await?;

        decoding::decode_output(raw)
    }

    /// Whether the model is currently loaded. Diagnostics only; `detect`
    /// loads on demand regardless.
    pub fn is_ready(&self) -> bool {
        self.manager.is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DetectionBackend;
    use crate::tensor::{ImageTensor, NUM_CANDIDATES, RawOutput, live_tensor_count};
    use ndarray::{Array3, ArrayD, IxDyn};
    use serial_test::serial;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning a constant-score output, counting invocations.
    struct CountingBackend {
        calls: AtomicUsize,
        shape: Vec<usize>,
    }

    impl CountingBackend {
        fn contract() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                shape: vec![1, 5, NUM_CANDIDATES],
            }
        }

        fn with_shape(shape: Vec<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                shape,
            }
        }
    }

    impl DetectionBackend for CountingBackend {
        fn execute(&self, input: &ImageTensor) -> Result<RawOutput, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(input.shape(), &[1, 3, 640, 640]);
            if self.shape == [1, 5, NUM_CANDIDATES] {
                let data = Array3::from_elem((1, 5, NUM_CANDIDATES), 0.25f32);
                Ok(RawOutput::new(data.into_dyn()))
            } else {
                Ok(RawOutput::new(ArrayD::zeros(IxDyn(&self.shape))))
            }
        }
    }

    fn pipeline_with(backend: Arc<CountingBackend>) -> DetectionPipeline {
        let manager = ModelManager::with_loader(move || {
            Ok(Arc::clone(&backend) as Arc<dyn DetectionBackend>)
        });
        DetectionPipeline::new(Arc::new(manager), None)
    }

    fn test_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(80, 60, image::Rgb([120, 30, 200]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    #[serial]
    async fn test_detect_returns_full_candidate_set() {
        let backend = Arc::new(CountingBackend::contract());
        let pipeline = pipeline_with(Arc::clone(&backend));

        assert!(!pipeline.is_ready());

        let set = pipeline.detect(test_png()).await.unwrap();

        assert_eq!(set.boxes.len(), NUM_CANDIDATES);
        assert_eq!(set.scores.len(), NUM_CANDIDATES);
        assert_eq!(set.classes.len(), NUM_CANDIDATES);
        assert!(set.scores.iter().all(|&s| s == 0.25));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(pipeline.is_ready());
    }

    #[tokio::test]
    #[serial]
    async fn test_undecodable_image_never_reaches_the_model() {
        let backend = Arc::new(CountingBackend::contract());
        let pipeline = pipeline_with(Arc::clone(&backend));

        let result = pipeline.detect(b"not an image".to_vec()).await;

        assert!(matches!(result, Err(DetectionError::ImageDecode(_))));
        assert_eq!(
            backend.calls.load(Ordering::SeqCst),
            0,
            "A failed decode must not advance to inference"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_bad_output_shape_is_fatal_for_the_request() {
        let backend = Arc::new(CountingBackend::with_shape(vec![1, 4, 100]));
        let pipeline = pipeline_with(backend);

        let result = pipeline.detect(test_png()).await;
        assert!(
            matches!(result, Err(DetectionError::OutputShape { .. })),
            "A shape violation must never produce a DetectionSet"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_no_tensor_survives_a_request() {
        let baseline = live_tensor_count();

        // Success path
        let pipeline = pipeline_with(Arc::new(CountingBackend::contract()));
        let _ = pipeline.detect(test_png()).await.unwrap();
        assert_eq!(
            live_tensor_count(),
            baseline,
            "Successful request should release all tensors"
        );

        // Decode-failure path
        let _ = pipeline.detect(b"garbage".to_vec()).await;
        assert_eq!(
            live_tensor_count(),
            baseline,
            "Failed decode should release all tensors"
        );

        // Output-shape-failure path
        let pipeline = pipeline_with(Arc::new(CountingBackend::with_shape(vec![2, 2])));
        let _ = pipeline.detect(test_png()).await;
        assert_eq!(
            live_tensor_count(),
            baseline,
            "Failed inference contract should release all tensors"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_load_failure_surfaces_and_allows_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let manager = ModelManager::with_loader(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DetectionError::ModelLoad("corrupt artifact".to_string()))
            } else {
                Ok(Arc::new(CountingBackend::contract()) as Arc<dyn DetectionBackend>)
            }
        });
        let pipeline = DetectionPipeline::new(Arc::new(manager), None);

        let first = pipeline.detect(test_png()).await;
        assert!(matches!(first, Err(DetectionError::ModelLoad(_))));
        assert!(!pipeline.is_ready());

        let second = pipeline.detect(test_png()).await;
        assert!(second.is_ok(), "The next request should retry the load");
        assert!(pipeline.is_ready());
    }
}
