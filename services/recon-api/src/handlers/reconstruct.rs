//! Reconstruction endpoint.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;
use crate::request::ReconstructRequest;
use crate::response::ReconstructionResponse;
use crate::state::AppState;

/// POST /reconstruct - Build a Gaussian splat from images or a video
///
/// The body is parsed here rather than through the `Json` extractor so that
/// malformed JSON is reported as a client error in the same `{"error"}` shape.
pub async fn reconstruct_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReconstructionResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    let parsed = serde_json::from_slice::<ReconstructRequest>(&body)
        .map_err(Into::into)
        .and_then(ReconstructRequest::validate);
    let (case_id, input) = match parsed {
        Ok(valid) => valid,
        Err(e) => {
            info!(request_id = %request_id, error = %e, "Rejected reconstruction request");
            metrics::record_request("unknown", e.kind());
            return Err(ApiError(e));
        }
    };

    let input_type = input.input_type();
    info!(
        request_id = %request_id,
        case_id = %case_id,
        input_type = input_type.as_str(),
        "Reconstruction requested"
    );

    match state.pipeline.run(&request_id, &case_id, input).await {
        Ok(response) => {
            metrics::record_request(input_type.as_str(), "ok");
            Ok(Json(response))
        }
        Err(e) => {
            metrics::record_request(input_type.as_str(), e.kind());
            Err(ApiError(e))
        }
    }
}
