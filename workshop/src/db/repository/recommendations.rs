use chrono::Utc;
use libsql::{params, Connection};
use nanoid::nanoid;

use crate::error::Result;
use crate::models::{Gift, ScoredRecommendation};

use super::{decode_json_list, parse_timestamp};

pub struct RecommendationRepository;

impl RecommendationRepository {
    /// Recommendations for a session in rank order, joined with their gifts.
    pub async fn list_for_session(
        conn: &Connection,
        session_id: &str,
    ) -> Result<Vec<ScoredRecommendation>> {
        let mut rows = conn
            .query(
                r#"
                SELECT r.score, r.reasoning, r.matched_interests,
                       g.id, g.name, g.description, g.price_cents, g.budget,
                       g.age_groups, g.tags, g.created_at
                FROM recommendations r
                JOIN gifts g ON g.id = r.gift_id
                WHERE r.session_id = ?1
                ORDER BY r.rank ASC
                "#,
                params![session_id],
            )
            .await?;

        let mut recommendations = Vec::new();
        while let Some(row) = rows.next().await? {
            recommendations.push(Self::row_to_recommendation(&row)?);
        }
        Ok(recommendations)
    }

    /// Replaces the session's recommendations and marks it completed with
    /// the narration, all or nothing.
    pub async fn save_pipeline_result(
        conn: &Connection,
        session_id: &str,
        recommendations: &[ScoredRecommendation],
        narration: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().await?;

        tx.execute(
            "DELETE FROM recommendations WHERE session_id = ?1",
            params![session_id],
        )
        .await?;

        for (rank, rec) in recommendations.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO recommendations (
                    id, session_id, gift_id, rank, score, reasoning,
                    matched_interests, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    nanoid!(),
                    session_id,
                    rec.gift.id.clone(),
                    rank as i64,
                    rec.score,
                    rec.reasoning.clone(),
                    serde_json::to_string(&rec.matched_interests)?,
                    now.clone(),
                ],
            )
            .await?;
        }

        tx.execute(
            r#"
            UPDATE sessions
            SET status = 'completed', narration = ?2, failure_reason = NULL,
                updated_at = ?3, completed_at = ?3
            WHERE id = ?1
            "#,
            params![session_id, narration, now],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    fn row_to_recommendation(row: &libsql::Row) -> Result<ScoredRecommendation> {
        let matched: String = row.get(2)?;
        let age_groups: String = row.get(8)?;
        let tags: String = row.get(9)?;

        Ok(ScoredRecommendation {
            score: row.get(0)?,
            reasoning: row.get(1)?,
            matched_interests: decode_json_list(Some(&matched)),
            gift: Gift {
                id: row.get(3)?,
                name: row.get(4)?,
                description: row.get(5)?,
                price_cents: row.get(6)?,
                budget: row.get::<String>(7)?.parse().unwrap_or_default(),
                age_groups: serde_json::from_str(&age_groups).unwrap_or_default(),
                tags: decode_json_list(Some(&tags)),
                created_at: parse_timestamp(&row.get::<String>(10)?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{GiftRepository, SessionRepository};
    use crate::db::schema::init_schema;
    use crate::models::{AgeGroup, BudgetTier, Session, SessionStatus};

    async fn setup_test_db() -> (Connection, String, Vec<Gift>) {
        let conn = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap()
            .connect()
            .unwrap();
        init_schema(&conn).await.unwrap();

        let session = Session::new();
        SessionRepository::create(&conn, &session).await.unwrap();

        let gifts = vec![
            Gift::new("Dino figures", BudgetTier::Low, vec![AgeGroup::Preschool]),
            Gift::new("Paint set", BudgetTier::Low, vec![AgeGroup::Preschool]),
        ];
        for gift in &gifts {
            GiftRepository::create(&conn, gift).await.unwrap();
        }
        (conn, session.id, gifts)
    }

    fn rec(gift: &Gift, score: f64) -> ScoredRecommendation {
        ScoredRecommendation {
            gift: gift.clone(),
            score,
            reasoning: format!("{} fits", gift.name),
            matched_interests: vec!["dinosaurs".to_string()],
        }
    }

    #[tokio::test]
    async fn test_save_pipeline_result_persists_in_rank_order() {
        let (conn, session_id, gifts) = setup_test_db().await;
        let recs = vec![rec(&gifts[1], 91.0), rec(&gifts[0], 80.0)];

        RecommendationRepository::save_pipeline_result(&conn, &session_id, &recs, "Ho ho ho")
            .await
            .unwrap();

        let loaded = RecommendationRepository::list_for_session(&conn, &session_id)
            .await
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].gift.name, "Paint set");
        assert_eq!(loaded[0].score, 91.0);
        assert_eq!(loaded[1].gift.name, "Dino figures");

        let session = SessionRepository::get_by_id(&conn, &session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.narration.as_deref(), Some("Ho ho ho"));
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_recommendations() {
        let (conn, session_id, gifts) = setup_test_db().await;
        let first = vec![rec(&gifts[0], 50.0), rec(&gifts[1], 40.0)];
        RecommendationRepository::save_pipeline_result(&conn, &session_id, &first, "first")
            .await
            .unwrap();

        let second = vec![rec(&gifts[1], 99.0)];
        RecommendationRepository::save_pipeline_result(&conn, &session_id, &second, "second")
            .await
            .unwrap();

        let loaded = RecommendationRepository::list_for_session(&conn, &session_id)
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].gift.id, gifts[1].id);
    }
}
