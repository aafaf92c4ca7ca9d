//! HTTP mapping of the reconstruction error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recon_common::ReconError;
use serde_json::json;

/// A [`ReconError`] rendered as `{"error": "<message>"}` with its status code.
#[derive(Debug)]
pub struct ApiError(pub ReconError);

impl<E> From<E> for ApiError
where
    E: Into<ReconError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
