use axum::{extract::State, Extension, Json};
use wayfind_core::CacheStats;

use super::{ApiError, ApiResponse, AppState, ErrorCode, ResponseMeta};
use crate::middleware::RequestId;

/// GET /api/v1/cache/stats
pub(super) async fn cache_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CacheStats>>, ApiError> {
    let stats = state.pipeline.cache().stats().await.map_err(|e| {
        tracing::error!(error = %e, "cache stats query failed");
        ApiError::new(&req_id.0, ErrorCode::InternalError, "cache stats unavailable")
    })?;

    Ok(Json(ApiResponse {
        data: stats,
        meta: ResponseMeta::new(req_id.0),
    }))
}
