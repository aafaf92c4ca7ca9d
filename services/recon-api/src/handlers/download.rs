//! Encoded PLY retrieval.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use recon_common::ReconError;
use serde::Deserialize;
use storage::StorageError;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub filename: String,
}

/// GET /download_ply?filename=<name> - Stream a stored PLY file
pub async fn download_ply_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let asset = match state.storage.open(&params.filename).await {
        Ok(asset) => asset,
        Err(StorageError::NotFound(_)) => {
            info!(filename = %params.filename, "PLY not found");
            return Err(ApiError(ReconError::NotFound("PLY not found".to_string())));
        }
        Err(e) => {
            warn!(filename = %params.filename, error = %e, "PLY download failed");
            return Err(e.into());
        }
    };

    info!(filename = %params.filename, size = asset.size, "Serving PLY");

    let disposition = format!("attachment; filename=\"{}\"", params.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, asset.size.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(asset.chunks),
    )
        .into_response())
}
