use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pricebook_core::{
    export_archive, import_archive, ErrorClass, ImportStatistics, PipelineError,
    EXPORT_ARCHIVE_NAME,
};
use serde_json::json;
use tracing::{error, warn};

use crate::state::AppState;

pub const PRICES_PATH: &str = "/api/v0/prices";

/// Multipart field carrying the uploaded archive.
const UPLOAD_FIELD: &str = "file";

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(PRICES_PATH, post(upload_prices).get(download_prices))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Client faults echo the pipeline error; server faults only log it.
    fn from_pipeline(err: PipelineError, server_message: &str) -> Self {
        match err.class() {
            ErrorClass::ClientFault => {
                warn!(error = %err, "rejected request");
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            ErrorClass::ServerFault => {
                error!(error = %err, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, server_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn upload_prices(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportStatistics>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!(error = %rejection, "upload was not multipart");
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid file upload")
    })?;

    let archive = read_upload(&mut multipart).await?;
    let statistics = import_archive(state.repository(), archive)
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Internal server error"))?;

    Ok(Json(statistics))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|err| {
            warn!(error = %err, "failed to read multipart body");
            ApiError::new(err.status(), "Invalid file upload")
        })?;

        let Some(field) = field else {
            warn!("multipart body has no '{UPLOAD_FIELD}' field");
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid file upload"));
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let bytes = field.bytes().await.map_err(|err| {
            warn!(error = %err, "failed to read uploaded file");
            ApiError::new(err.status(), "Invalid file upload")
        })?;
        return Ok(bytes.to_vec());
    }
}

pub async fn download_prices(State(state): State<AppState>) -> Result<Response, ApiError> {
    let archive = export_archive(state.repository())
        .await
        .map_err(|err| ApiError::from_pipeline(err, "Failed to export data"))?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={EXPORT_ARCHIVE_NAME}"),
        ),
    ];
    Ok((headers, archive).into_response())
}
