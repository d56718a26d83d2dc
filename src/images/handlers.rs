use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};

use super::{
    dto::{HealthResponse, UploadResponse},
    services::{classify_and_store, is_allowed_extension, sanitize_filename},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

pub fn upload_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// POST /api/upload (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut mp = mp.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(FILE_FIELD) {
            let name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(multipart_error)?;
            file = Some((name, data));
            break;
        }
    }

    let (raw_name, data) = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let filename = sanitize_filename(&raw_name)
        .filter(|name| is_allowed_extension(name))
        .ok_or_else(|| {
            warn!(%username, filename = %raw_name, "rejected upload filename");
            ApiError::bad_request("Invalid file")
        })?;

    let (record, prediction) = classify_and_store(&state, filename, data).await?;

    Ok(Json(UploadResponse {
        filename: record.filename,
        category: prediction.category,
        confidence: prediction.confidence_percent(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.classifier.status(),
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(e.body_text())
    }
}
