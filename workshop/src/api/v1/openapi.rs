use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workshop API",
        version = "1.0.0",
        description = "Self-hostable gift workshop. Sessions, questionnaire answers, a streamed AI pipeline and shareable gift lists.",
    ),
    paths(
        handlers::health::health_check,
        handlers::sessions::create_session,
        handlers::sessions::get_session,
        handlers::sessions::attach_photo,
        handlers::sessions::submit_profile,
        handlers::sessions::set_nice_points,
        handlers::pipeline::run_pipeline,
        handlers::shares::create_share,
        handlers::shares::get_shared,
        handlers::gifts::list_gifts,
        handlers::gifts::create_gift,
        handlers::admin::run_retention,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Common
        dto::common::V1BudgetTier,
        dto::common::V1AgeGroup,
        dto::common::V1SessionStatus,
        // Sessions
        dto::sessions::AttachPhotoRequest,
        dto::sessions::SubmitProfileRequest,
        dto::sessions::NicePointsRequest,
        dto::sessions::SessionResponse,
        dto::sessions::ProfileResponse,
        dto::sessions::RecommendationResponse,
        dto::sessions::SessionDetailResponse,
        // Gifts
        dto::gifts::CreateGiftRequest,
        dto::gifts::GiftResponse,
        dto::gifts::ListGiftsResponse,
        // Shares
        dto::shares::ShareResponse,
        dto::shares::SharedGiftListResponse,
        // Admin
        dto::admin::RetentionRunResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::LlmStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "sessions", description = "Workshop sessions and questionnaire answers"),
        (name = "pipeline", description = "Streamed agent pipeline (server-sent events)"),
        (name = "shares", description = "Public read-only gift lists"),
        (name = "gifts", description = "Gift catalog"),
        (name = "admin", description = "Administrative operations (auth required)"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
