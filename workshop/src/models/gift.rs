use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

use super::{AgeGroup, BudgetTier};

/// A catalog entry that gift matching can recommend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Gift {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub budget: BudgetTier,
    pub age_groups: Vec<AgeGroup>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Gift {
    pub fn new(name: impl Into<String>, budget: BudgetTier, age_groups: Vec<AgeGroup>) -> Self {
        Self {
            id: nanoid!(),
            name: name.into(),
            description: String::new(),
            price_cents: 0,
            budget,
            age_groups,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Tagged for the age group and not above the budget.
    pub fn is_compatible(&self, age_group: AgeGroup, budget: BudgetTier) -> bool {
        self.budget <= budget && self.age_groups.contains(&age_group)
    }
}

/// A gift with the score and reasoning assigned by gift matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecommendation {
    pub gift: Gift,
    /// 0 to 100, higher is better.
    pub score: f64,
    pub reasoning: String,
    pub matched_interests: Vec<String>,
}

/// Stable sort by descending score; equal scores keep their input order.
pub fn rank_recommendations(recommendations: &mut [ScoredRecommendation]) {
    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
}
