use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    AgeGroup, BudgetTier, Gift, KidProfile, ProfileInsights, ScoredRecommendation, Session,
    SessionStatus,
};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------

/// Session lifecycle and lookup.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: &Session) -> Result<()>;
    async fn get_session(&self, id: &str) -> Result<Option<Session>>;
    async fn get_session_by_share_slug(&self, slug: &str) -> Result<Option<Session>>;
    async fn update_session(&self, session: &Session) -> Result<()>;
    async fn update_session_status(
        &self,
        id: &str,
        status: SessionStatus,
        failure_reason: Option<&str>,
    ) -> Result<()>;
    /// Sessions created before `before` that never completed.
    async fn get_retention_candidates(&self, before: DateTime<Utc>) -> Result<Vec<Session>>;
    async fn delete_session(&self, id: &str) -> Result<bool>;
}

/// Questionnaire answers and the insights derived from them.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, session_id: &str) -> Result<Option<KidProfile>>;
    async fn upsert_profile(&self, profile: &KidProfile) -> Result<()>;
    async fn save_profile_insights(
        &self,
        session_id: &str,
        insights: &ProfileInsights,
    ) -> Result<()>;
}

/// Gift catalog.
#[async_trait]
pub trait GiftStore: Send + Sync {
    async fn create_gift(&self, gift: &Gift) -> Result<()>;
    async fn list_gifts(
        &self,
        age_group: Option<AgeGroup>,
        budget: Option<BudgetTier>,
    ) -> Result<Vec<Gift>>;
    async fn count_gifts(&self) -> Result<i64>;
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn get_recommendations(&self, session_id: &str) -> Result<Vec<ScoredRecommendation>>;

    /// Atomically replace recommendations, store the narration and mark the
    /// session completed.
    async fn save_pipeline_result(
        &self,
        session_id: &str,
        recommendations: &[ScoredRecommendation],
        narration: &str,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Unified backend supertrait
// ---------------------------------------------------------------------------

/// A complete database backend that combines all store traits plus lifecycle
/// operations.
#[async_trait]
pub trait DatabaseBackend: SessionStore + ProfileStore + GiftStore + RecommendationStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
