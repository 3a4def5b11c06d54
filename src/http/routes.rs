use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio::sync::Semaphore;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analysis::classifier::Prediction;
use crate::analysis::features::{SchemaDescriptor, FEATURE_SCHEMA, SCHEMA_VERSION};
use crate::config::ServerConfig;
use crate::context::InferenceContext;
use crate::error::{ErrorCode, InferenceError};

/// Multipart field carrying the uploaded clip
const FILE_FIELD: &str = "file";

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub context: InferenceContext,
    request_timeout: Duration,
    /// Held by each blocking classification until it finishes, including
    /// tasks whose request already timed out
    compute_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(context: InferenceContext, request_timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            context,
            request_timeout,
            compute_permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }
}

/// HTTP-layer error code constants
///
/// Error code range: 4001-4005
pub struct HttpErrorCodes {}

impl HttpErrorCodes {
    pub const NO_FILE_UPLOADED: i32 = 4001;
    pub const NO_FILE_SELECTED: i32 = 4002;
    pub const UPLOAD_FAILED: i32 = 4003;
    pub const TIMEOUT: i32 = 4004;
    pub const INTERNAL: i32 = 4005;
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    /// Request carries no `file` part
    NoFileUploaded,
    /// `file` part has an empty filename
    NoFileSelected,
    /// Multipart body could not be read
    Upload { status: StatusCode, message: String },
    /// Decoding, extraction or classification failed
    Inference(InferenceError),
    /// Inference did not finish within the request timeout
    Timeout,
    Internal(String),
}

impl HttpServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoFileUploaded | Self::NoFileSelected => StatusCode::BAD_REQUEST,
            Self::Upload { status, .. } => *status,
            Self::Inference(InferenceError::Audio(_)) => StatusCode::BAD_REQUEST,
            Self::Inference(InferenceError::Extraction(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Inference(InferenceError::Model(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorCode for HttpServerError {
    fn code(&self) -> i32 {
        match self {
            Self::NoFileUploaded => HttpErrorCodes::NO_FILE_UPLOADED,
            Self::NoFileSelected => HttpErrorCodes::NO_FILE_SELECTED,
            Self::Upload { .. } => HttpErrorCodes::UPLOAD_FAILED,
            Self::Inference(err) => err.code(),
            Self::Timeout => HttpErrorCodes::TIMEOUT,
            Self::Internal(_) => HttpErrorCodes::INTERNAL,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NoFileUploaded => "No file uploaded".to_string(),
            Self::NoFileSelected => "No file selected".to_string(),
            Self::Upload { message, .. } => message.clone(),
            Self::Inference(err) => err.message(),
            Self::Timeout => "Classification timed out".to_string(),
            Self::Internal(msg) => msg.clone(),
        }
    }
}

impl From<InferenceError> for HttpServerError {
    fn from(err: InferenceError) -> Self {
        Self::Inference(err)
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("[HTTP] {} (code {}): {}", status, self.code(), self.message());
        } else {
            log::warn!("[HTTP] {} (code {}): {}", status, self.code(), self.message());
        }

        (
            status,
            Json(serde_json::json!({ "error": self.message(), "code": self.code() })),
        )
            .into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_labels: usize,
    pub schema_version: u32,
}

/// Build the Axum router with all handlers and middleware.
pub fn build_router(context: InferenceContext, server: &ServerConfig) -> Router {
    let state = AppState::new(
        context,
        Duration::from_millis(server.request_timeout_ms),
        server.max_concurrent_requests,
    );

    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/schema", get(schema))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(ConcurrencyLimitLayer::new(server.max_concurrent_requests.max(1)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_labels: state.context.classifier().labels().len(),
        schema_version: SCHEMA_VERSION,
    })
}

pub async fn schema() -> Json<SchemaDescriptor> {
    Json(FEATURE_SCHEMA.descriptor())
}

/// Classify an uploaded WAV clip.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, HttpServerError> {
    // A body that is not multipart carries no file part at all
    let mut multipart = multipart.map_err(|_| HttpServerError::NoFileUploaded)?;
    let upload = read_upload(&mut multipart).await?;
    tracing::debug!("[HTTP] /predict received {} bytes", upload.len());

    let context = state.context.clone();
    let permits = Arc::clone(&state.compute_permits);
    let work = async move {
        // Waiting for a permit counts against the request timeout
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|err| HttpServerError::Internal(format!("compute permits closed: {}", err)))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            context.classify_wav_bytes(&upload)
        })
        .await
        .map_err(|join_err| {
            HttpServerError::Internal(format!("classification task failed: {}", join_err))
        })
    };

    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(Ok(result)) => Ok(Json(result?)),
        Ok(Err(err)) => Err(err),
        // The blocking task keeps its permit until it finishes; its result is discarded
        Err(_) => Err(HttpServerError::Timeout),
    }
}

/// Bytes of the first `file` part that is an actual file upload
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, HttpServerError> {
    let upload_error = |err: axum::extract::multipart::MultipartError| HttpServerError::Upload {
        status: err.status(),
        message: err.body_text(),
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Parts without a filename are plain form values, not uploads
        let has_name = match field.file_name() {
            None => continue,
            Some(name) => !name.is_empty(),
        };
        if !has_name {
            return Err(HttpServerError::NoFileSelected);
        }
        return field.bytes().await.map_err(upload_error);
    }

    Err(HttpServerError::NoFileUploaded)
}
