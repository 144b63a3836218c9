//! Share link DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sessions::RecommendationResponse;

/// Response for `POST /v1/sessions/{sessionId}/share`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub session_id: String,
    pub share_slug: String,
    /// Relative path of the public read-only view.
    pub share_path: String,
}

impl ShareResponse {
    pub fn new(session_id: String, share_slug: String) -> Self {
        let share_path = format!("/api/v1/shared/{share_slug}");
        Self {
            session_id,
            share_slug,
            share_path,
        }
    }
}

/// Response for `GET /v1/shared/{slug}`. Leaves out the photo and the
/// questionnaire answers.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedGiftListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid_name: Option<String>,
    pub nice_points: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    pub recommendations: Vec<RecommendationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub completed_at: Option<DateTime<Utc>>,
}
