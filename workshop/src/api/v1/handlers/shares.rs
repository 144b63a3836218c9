//! v1 share link handlers.

use axum::extract::{Path, State};
use nanoid::nanoid;

use crate::api::v1::dto::{RecommendationResponse, ShareResponse, SharedGiftListResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::models::SessionStatus;

const SHARE_SLUG_LEN: usize = 10;

/// `POST /api/v1/sessions/{sessionId}/share`
///
/// Creates the public slug for a completed session. Calling it again returns
/// the existing slug.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/share",
    tag = "shares",
    operation_id = "shares.create",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 201, description = "Share link created", body = ShareResponse),
        (status = 200, description = "Share link already existed", body = ShareResponse),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session has no finished gift list", body = ApiError),
    )
)]
pub async fn create_share(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<ShareResponse> {
    let mut session = match state.db.get_session(&id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return ApiResponse::error(ErrorCode::NotFound, format!("Session {id} not found"))
        }
        Err(e) => return e.into(),
    };

    if session.status != SessionStatus::Completed {
        return ApiResponse::error(
            ErrorCode::Conflict,
            "Only a completed workshop can be shared",
        );
    }

    if let Some(slug) = session.share_slug.clone() {
        return ApiResponse::success(ShareResponse::new(session.id, slug));
    }

    let slug = nanoid!(SHARE_SLUG_LEN);
    session.share_slug = Some(slug.clone());
    if let Err(e) = state.db.update_session(&session).await {
        return e.into();
    }

    tracing::info!(session_id = %id, share_slug = %slug, "Share link created");
    ApiResponse::created(ShareResponse::new(session.id, slug))
}

/// `GET /api/v1/shared/{slug}`
#[utoipa::path(
    get,
    path = "/api/v1/shared/{slug}",
    tag = "shares",
    operation_id = "shares.get",
    params(("slug" = String, Path, description = "Share slug")),
    responses(
        (status = 200, description = "Shared gift list", body = SharedGiftListResponse),
        (status = 404, description = "Unknown share link", body = ApiError),
    )
)]
pub async fn get_shared(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResponse<SharedGiftListResponse> {
    let session = match state.db.get_session_by_share_slug(&slug).await {
        Ok(Some(session)) => session,
        Ok(None) => return ApiResponse::error(ErrorCode::NotFound, "Share link not found"),
        Err(e) => return e.into(),
    };

    let kid_name = match state.db.get_profile(&session.id).await {
        Ok(profile) => profile.map(|p| p.name),
        Err(e) => return e.into(),
    };

    let recommendations = match state.db.get_recommendations(&session.id).await {
        Ok(recs) => recs,
        Err(e) => return e.into(),
    };

    ApiResponse::success(SharedGiftListResponse {
        kid_name,
        nice_points: session.nice_points,
        narration: session.narration,
        recommendations: RecommendationResponse::ranked(recommendations),
        completed_at: session.completed_at,
    })
}
