//! v1 Admin handlers.

use axum::extract::State;

use crate::api::v1::dto::RetentionRunResponse;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

/// `POST /api/v1/admin/retention:run`
#[utoipa::path(
    post,
    path = "/api/v1/admin/retention:run",
    tag = "admin",
    responses(
        (status = 200, description = "Retention sweep completed", body = RetentionRunResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn run_retention(State(state): State<AppState>) -> ApiResponse<RetentionRunResponse> {
    match state.retention.run_once().await {
        Ok(sessions_deleted) => ApiResponse::success(RetentionRunResponse {
            sessions_deleted,
            max_age_days: state.retention.max_age_days(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "Manual retention sweep failed");
            ApiResponse::error(ErrorCode::InternalError, "Retention sweep failed")
        }
    }
}
