use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use inference::{DetectionError, DetectionPipeline, DetectionSet};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DetectionPipeline>,
}

/// The outbound error shape: a single human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        let status = match &err {
            DetectionError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            DetectionError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectionError::Inference(_) | DetectionError::OutputShape { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "Request failed");
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

pub fn build_router(pipeline: Arc<DetectionPipeline>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/detect", post(detect))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(AppState { pipeline })
}

/// One detection request: the image travels in the multipart field named
/// `image`; other fields are ignored.
async fn detect(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectionSet>, ApiError> {
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request(format!("Invalid multipart payload: {}", e))
    })? {
        if field.name() == Some("image") {
            let data = field.bytes().await.map_err(|e| {
                ApiError::bad_request(format!("Failed to read image field: {}", e))
            })?;
            image = Some(data.to_vec());
            break;
        }
    }

    let image = image.ok_or_else(|| ApiError::bad_request("No image provided"))?;

    tracing::debug!(payload_bytes = image.len(), "Image received");

    let detections = state.pipeline.detect(image).await?;

    tracing::debug!(candidates = detections.len(), "Detection completed");

    Ok(Json(detections))
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    model_loaded: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        model_loaded: state.pipeline.is_ready(),
    })
}
