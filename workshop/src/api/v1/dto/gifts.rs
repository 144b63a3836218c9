//! Gift catalog DTOs for the v1 API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{V1AgeGroup, V1BudgetTier};
use crate::models;

/// Query parameters for `GET /v1/gifts`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListGiftsQuery {
    /// Only gifts suitable for this age group (e.g. `preschool`).
    pub age_group: Option<String>,
    /// Only gifts at or below this budget tier.
    pub budget: Option<String>,
}

/// Request body for `POST /v1/gifts`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiftRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    pub budget: V1BudgetTier,
    #[validate(length(min = 1))]
    pub age_groups: Vec<V1AgeGroup>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateGiftRequest {
    pub fn into_gift(self) -> models::Gift {
        let age_groups = self.age_groups.into_iter().map(Into::into).collect();
        let mut gift = models::Gift::new(self.name.trim(), self.budget.into(), age_groups);
        gift.description = self.description;
        gift.price_cents = self.price_cents;
        gift.tags = models::normalize_interests(self.tags, usize::MAX);
        gift
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiftResponse {
    pub gift_id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub budget: V1BudgetTier,
    pub age_groups: Vec<V1AgeGroup>,
    pub tags: Vec<String>,
}

impl From<models::Gift> for GiftResponse {
    fn from(gift: models::Gift) -> Self {
        Self {
            gift_id: gift.id,
            name: gift.name,
            description: gift.description,
            price_cents: gift.price_cents,
            budget: gift.budget.into(),
            age_groups: gift.age_groups.into_iter().map(Into::into).collect(),
            tags: gift.tags,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListGiftsResponse {
    pub gifts: Vec<GiftResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_builds_gift_with_clean_tags() {
        let req: CreateGiftRequest = serde_json::from_value(serde_json::json!({
            "name": " Kite ",
            "priceCents": 1500,
            "budget": "low",
            "ageGroups": ["school_age", "tween"],
            "tags": ["outdoors", " Outdoors ", ""]
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let gift = req.into_gift();
        assert_eq!(gift.name, "Kite");
        assert_eq!(gift.tags, vec!["outdoors"]);
        assert_eq!(
            gift.age_groups,
            vec![models::AgeGroup::SchoolAge, models::AgeGroup::Tween]
        );
    }

    #[test]
    fn test_create_request_needs_an_age_group() {
        let req: CreateGiftRequest = serde_json::from_value(serde_json::json!({
            "name": "Kite",
            "priceCents": 1500,
            "budget": "low",
            "ageGroups": []
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
