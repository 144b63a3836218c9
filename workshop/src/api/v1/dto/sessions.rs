//! Session, questionnaire and result DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{V1AgeGroup, V1BudgetTier, V1SessionStatus};
use super::gifts::GiftResponse;
use crate::models;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `PUT /v1/sessions/{sessionId}/photo`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachPhotoRequest {
    /// Absolute `http(s)` URL of an already-uploaded photo.
    pub photo_url: String,
}

/// Request body for `PUT /v1/sessions/{sessionId}/profile`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Age in years, 0 to 17.
    #[validate(range(max = 17))]
    pub age: u8,
    /// One to ten interests. Blank entries and duplicates are dropped.
    #[validate(length(min = 1, max = 10))]
    pub interests: Vec<String>,
    pub budget: V1BudgetTier,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Request body for `PUT /v1/sessions/{sessionId}/nice-points`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NicePointsRequest {
    /// Clamped to `0..=100`.
    pub nice_points: i64,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub status: V1SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub nice_points: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    /// Why the last pipeline run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_slug: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<models::Session> for SessionResponse {
    fn from(session: models::Session) -> Self {
        Self {
            session_id: session.id,
            status: session.status.into(),
            photo_url: session.photo_url,
            nice_points: session.nice_points,
            narration: session.narration,
            failure_reason: session.failure_reason,
            share_slug: session.share_slug,
            created_at: session.created_at,
            updated_at: session.updated_at,
            completed_at: session.completed_at,
        }
    }
}

/// Questionnaire answers plus what the last run derived from them.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub name: String,
    pub age: u8,
    pub interests: Vec<String>,
    pub budget: V1BudgetTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<V1AgeGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gift_themes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_interests: Vec<String>,
}

impl From<models::KidProfile> for ProfileResponse {
    fn from(profile: models::KidProfile) -> Self {
        let insights = profile.insights;
        Self {
            name: profile.name,
            age: profile.age,
            interests: profile.interests,
            budget: profile.budget.into(),
            notes: profile.notes,
            age_group: insights.as_ref().map(|i| i.age_group.into()),
            summary: insights.as_ref().map(|i| i.summary.clone()),
            gift_themes: insights
                .as_ref()
                .map(|i| i.gift_themes.clone())
                .unwrap_or_default(),
            merged_interests: insights.map(|i| i.merged_interests).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    /// 1-based position, best first.
    pub rank: u32,
    pub gift: GiftResponse,
    pub score: f64,
    pub reasoning: String,
    pub matched_interests: Vec<String>,
}

impl RecommendationResponse {
    /// Numbers the recommendations in the order given.
    pub fn ranked(recommendations: Vec<models::ScoredRecommendation>) -> Vec<Self> {
        recommendations
            .into_iter()
            .zip(1u32..)
            .map(|(rec, rank)| Self {
                rank,
                gift: rec.gift.into(),
                score: rec.score,
                reasoning: rec.reasoning,
                matched_interests: rec.matched_interests,
            })
            .collect()
    }
}

/// Response for `GET /v1/sessions/{sessionId}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailResponse {
    pub session: SessionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileResponse>,
    pub recommendations: Vec<RecommendationResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn request(age: u8, interests: Vec<&str>) -> SubmitProfileRequest {
        SubmitProfileRequest {
            name: "Mia".to_string(),
            age,
            interests: interests.into_iter().map(String::from).collect(),
            budget: V1BudgetTier::Low,
            notes: None,
        }
    }

    #[test]
    fn test_profile_request_bounds() {
        assert!(request(4, vec!["dinosaurs"]).validate().is_ok());
        assert!(request(18, vec!["dinosaurs"]).validate().is_err());
        assert!(request(4, vec![]).validate().is_err());
        assert!(request(4, vec!["x"; 11]).validate().is_err());
    }

    #[test]
    fn test_profile_request_rejects_long_notes() {
        let mut req = request(4, vec!["dinosaurs"]);
        req.notes = Some("a".repeat(1001));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_session_response_omits_unset_fields() {
        let json = serde_json::to_value(SessionResponse::from(models::Session::new())).unwrap();
        assert_eq!(json["status"], "created");
        assert_eq!(json["nicePoints"], 0);
        assert!(json.get("narration").is_none());
        assert!(json.get("shareSlug").is_none());
    }
}
