use crate::db::connection::Database;
use crate::db::repository::{
    GiftRepository, ProfileRepository, RecommendationRepository, SessionRepository,
};
use crate::db::traits::{
    DatabaseBackend, GiftStore, ProfileStore, RecommendationStore, SessionStore,
};
use crate::error::Result;
use crate::models::{
    AgeGroup, BudgetTier, Gift, KidProfile, ProfileInsights, ScoredRecommendation, Session,
    SessionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for LibSqlBackend {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let conn = self.db.connect()?;
        SessionRepository::create(&conn, session).await
    }
    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.db.connect()?;
        SessionRepository::get_by_id(&conn, id).await
    }
    async fn get_session_by_share_slug(&self, slug: &str) -> Result<Option<Session>> {
        let conn = self.db.connect()?;
        SessionRepository::get_by_share_slug(&conn, slug).await
    }
    async fn update_session(&self, session: &Session) -> Result<()> {
        let conn = self.db.connect()?;
        SessionRepository::update(&conn, session).await
    }
    async fn update_session_status(
        &self,
        id: &str,
        status: SessionStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        SessionRepository::update_status(&conn, id, status, failure_reason).await
    }
    async fn get_retention_candidates(&self, before: DateTime<Utc>) -> Result<Vec<Session>> {
        let conn = self.db.connect()?;
        SessionRepository::get_retention_candidates(&conn, before).await
    }
    async fn delete_session(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        SessionRepository::delete(&conn, id).await
    }
}

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn get_profile(&self, session_id: &str) -> Result<Option<KidProfile>> {
        let conn = self.db.connect()?;
        ProfileRepository::get(&conn, session_id).await
    }
    async fn upsert_profile(&self, profile: &KidProfile) -> Result<()> {
        let conn = self.db.connect()?;
        ProfileRepository::upsert(&conn, profile).await
    }
    async fn save_profile_insights(
        &self,
        session_id: &str,
        insights: &ProfileInsights,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        ProfileRepository::save_insights(&conn, session_id, insights).await
    }
}

#[async_trait]
impl GiftStore for LibSqlBackend {
    async fn create_gift(&self, gift: &Gift) -> Result<()> {
        let conn = self.db.connect()?;
        GiftRepository::create(&conn, gift).await
    }
    async fn list_gifts(
        &self,
        age_group: Option<AgeGroup>,
        budget: Option<BudgetTier>,
    ) -> Result<Vec<Gift>> {
        let conn = self.db.connect()?;
        GiftRepository::list(&conn, age_group, budget).await
    }
    async fn count_gifts(&self) -> Result<i64> {
        let conn = self.db.connect()?;
        GiftRepository::count(&conn).await
    }
}

#[async_trait]
impl RecommendationStore for LibSqlBackend {
    async fn get_recommendations(&self, session_id: &str) -> Result<Vec<ScoredRecommendation>> {
        let conn = self.db.connect()?;
        RecommendationRepository::list_for_session(&conn, session_id).await
    }
    async fn save_pipeline_result(
        &self,
        session_id: &str,
        recommendations: &[ScoredRecommendation],
        narration: &str,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        RecommendationRepository::save_pipeline_result(&conn, session_id, recommendations, narration)
            .await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn setup_test_db() -> (LibSqlBackend, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.db");
        let config = DatabaseConfig::local(format!("file:{}", path.display()));
        let db = Database::new(&config)
            .await
            .expect("Failed to create database");

        (LibSqlBackend::new(db), dir)
    }

    #[tokio::test]
    async fn test_backend_delete_session_removes_profile() {
        let (backend, _dir) = setup_test_db().await;
        let session = Session::new();
        backend.create_session(&session).await.unwrap();
        backend
            .upsert_profile(&KidProfile::new(
                session.id.clone(),
                "Leo".to_string(),
                7,
                vec!["space".to_string()],
            ))
            .await
            .unwrap();

        assert!(backend.delete_session(&session.id).await.unwrap());
        assert!(backend.get_profile(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_status_update_is_visible_across_connections() {
        let (backend, _dir) = setup_test_db().await;
        let session = Session::new();
        backend.create_session(&session).await.unwrap();

        backend
            .update_session_status(&session.id, SessionStatus::Processing, None)
            .await
            .unwrap();

        let loaded = backend.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Processing);
    }
}
