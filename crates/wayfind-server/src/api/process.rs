use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use wayfind_core::ProcessedContent;
use wayfind_pipeline::PipelineError;

use super::{ApiError, ApiResponse, AppState, ErrorCode, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct ProcessRequest {
    url: String,
}

fn map_pipeline_error(request_id: &str, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::InvalidSource(e) => {
            tracing::info!(error = %e, "rejected source URL");
            ApiError::new(request_id, ErrorCode::InvalidSource, e.to_string())
        }
        PipelineError::ExtractionParse(e) => {
            tracing::error!(error = %e, "extraction failed");
            ApiError::new(
                request_id,
                ErrorCode::ExtractionFailed,
                "could not extract places from this source; retry later",
            )
        }
    }
}

/// POST /api/v1/process: resolve a URL to cached or freshly extracted places.
pub(super) async fn process_url(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ProcessRequest>,
) -> Result<Json<ApiResponse<ProcessedContent>>, ApiError> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            ErrorCode::ValidationError,
            "url is required",
        ));
    }

    let processed = state
        .pipeline
        .process_content(url)
        .await
        .map_err(|e| map_pipeline_error(&req_id.0, &e))?;

    Ok(Json(ApiResponse {
        data: processed,
        meta: ResponseMeta::new(req_id.0),
    }))
}
