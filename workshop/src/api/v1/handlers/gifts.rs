//! v1 gift catalog handlers.

use axum::extract::{Query, State};
use validator::Validate;

use crate::api::v1::dto::{CreateGiftRequest, GiftResponse, ListGiftsQuery, ListGiftsResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode, ResponseMeta};
use crate::api::{AppJson, AppState};
use crate::models::{AgeGroup, BudgetTier};

/// `GET /api/v1/gifts`
#[utoipa::path(
    get,
    path = "/api/v1/gifts",
    tag = "gifts",
    operation_id = "gifts.list",
    params(ListGiftsQuery),
    responses(
        (status = 200, description = "Catalog listed", body = ListGiftsResponse),
        (status = 400, description = "Unknown filter value", body = ApiError),
    )
)]
pub async fn list_gifts(
    State(state): State<AppState>,
    Query(query): Query<ListGiftsQuery>,
) -> ApiResponse<ListGiftsResponse> {
    let age_group = match query.age_group.as_deref().map(str::parse::<AgeGroup>) {
        None => None,
        Some(Ok(group)) => Some(group),
        Some(Err(e)) => return ApiResponse::error(ErrorCode::InvalidRequest, e),
    };
    let budget = match query.budget.as_deref().map(str::parse::<BudgetTier>) {
        None => None,
        Some(Ok(tier)) => Some(tier),
        Some(Err(e)) => return ApiResponse::error(ErrorCode::InvalidRequest, e),
    };

    match state.db.list_gifts(age_group, budget).await {
        Ok(gifts) => {
            let total = gifts.len() as u64;
            ApiResponse::success_with_meta(
                ListGiftsResponse {
                    gifts: gifts.into_iter().map(GiftResponse::from).collect(),
                },
                ResponseMeta { total: Some(total) },
            )
        }
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/gifts`
#[utoipa::path(
    post,
    path = "/api/v1/gifts",
    tag = "gifts",
    operation_id = "gifts.create",
    request_body = CreateGiftRequest,
    responses(
        (status = 201, description = "Gift added", body = GiftResponse),
        (status = 400, description = "Invalid gift", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_gift(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateGiftRequest>,
) -> ApiResponse<GiftResponse> {
    if let Err(e) = req.validate() {
        return ApiResponse::error(ErrorCode::InvalidRequest, e.to_string());
    }
    if req.name.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Name cannot be empty");
    }

    let gift = req.into_gift();
    if let Err(e) = state.db.create_gift(&gift).await {
        return e.into();
    }

    tracing::info!(gift_id = %gift.id, name = %gift.name, "Gift added to catalog");
    ApiResponse::created(GiftResponse::from(gift))
}
