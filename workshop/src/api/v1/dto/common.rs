//! Enums shared by several v1 endpoints, with conversions to and from the
//! domain models.

use serde::{Deserialize, Serialize};

use crate::models::{AgeGroup, BudgetTier, SessionStatus};

/// Wire format: `"low"`, `"medium"` or `"high"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum V1BudgetTier {
    Low,
    Medium,
    High,
}

impl From<BudgetTier> for V1BudgetTier {
    fn from(tier: BudgetTier) -> Self {
        match tier {
            BudgetTier::Low => Self::Low,
            BudgetTier::Medium => Self::Medium,
            BudgetTier::High => Self::High,
        }
    }
}

impl From<V1BudgetTier> for BudgetTier {
    fn from(tier: V1BudgetTier) -> Self {
        match tier {
            V1BudgetTier::Low => Self::Low,
            V1BudgetTier::Medium => Self::Medium,
            V1BudgetTier::High => Self::High,
        }
    }
}

/// Wire format: `"toddler"`, `"preschool"`, `"school_age"`, `"tween"` or `"teen"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum V1AgeGroup {
    Toddler,
    Preschool,
    SchoolAge,
    Tween,
    Teen,
}

impl From<AgeGroup> for V1AgeGroup {
    fn from(group: AgeGroup) -> Self {
        match group {
            AgeGroup::Toddler => Self::Toddler,
            AgeGroup::Preschool => Self::Preschool,
            AgeGroup::SchoolAge => Self::SchoolAge,
            AgeGroup::Tween => Self::Tween,
            AgeGroup::Teen => Self::Teen,
        }
    }
}

impl From<V1AgeGroup> for AgeGroup {
    fn from(group: V1AgeGroup) -> Self {
        match group {
            V1AgeGroup::Toddler => Self::Toddler,
            V1AgeGroup::Preschool => Self::Preschool,
            V1AgeGroup::SchoolAge => Self::SchoolAge,
            V1AgeGroup::Tween => Self::Tween,
            V1AgeGroup::Teen => Self::Teen,
        }
    }
}

/// Session lifecycle as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum V1SessionStatus {
    Created,
    PhotoUploaded,
    ProfileSubmitted,
    Processing,
    Completed,
    Failed,
}

impl From<SessionStatus> for V1SessionStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Created => Self::Created,
            SessionStatus::PhotoUploaded => Self::PhotoUploaded,
            SessionStatus::ProfileSubmitted => Self::ProfileSubmitted,
            SessionStatus::Processing => Self::Processing,
            SessionStatus::Completed => Self::Completed,
            SessionStatus::Failed => Self::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_uses_snake_case_on_the_wire() {
        let json = serde_json::to_value(V1AgeGroup::from(AgeGroup::SchoolAge)).unwrap();
        assert_eq!(json, "school_age");
    }

    #[test]
    fn test_budget_converts_both_ways() {
        for tier in [BudgetTier::Low, BudgetTier::Medium, BudgetTier::High] {
            assert_eq!(BudgetTier::from(V1BudgetTier::from(tier)), tier);
        }
    }
}
