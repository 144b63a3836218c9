use chrono::Utc;
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{AgeGroup, KidProfile, ProfileInsights};

use super::{decode_json_list, parse_timestamp};

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get(conn: &Connection, session_id: &str) -> Result<Option<KidProfile>> {
        let mut rows = conn
            .query(
                r#"
                SELECT session_id, name, age, interests, budget, notes,
                       age_group, merged_interests, summary, gift_themes,
                       created_at, updated_at
                FROM kid_profiles WHERE session_id = ?1
                "#,
                params![session_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_profile(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Inserts or replaces the questionnaire answers. Stale insights from an
    /// earlier run are cleared because they no longer match the answers.
    pub async fn upsert(conn: &Connection, profile: &KidProfile) -> Result<()> {
        let interests_json = serde_json::to_string(&profile.interests)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO kid_profiles (
                session_id, name, age, interests, budget, notes,
                age_group, merged_interests, summary, gift_themes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, NULL, NULL, ?7, ?8)
            ON CONFLICT(session_id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                interests = excluded.interests,
                budget = excluded.budget,
                notes = excluded.notes,
                age_group = NULL,
                merged_interests = NULL,
                summary = NULL,
                gift_themes = NULL,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.session_id.clone(),
                profile.name.clone(),
                profile.age as i64,
                interests_json,
                profile.budget.to_string(),
                profile.notes.clone(),
                profile.created_at.to_rfc3339(),
                now,
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn save_insights(
        conn: &Connection,
        session_id: &str,
        insights: &ProfileInsights,
    ) -> Result<()> {
        conn.execute(
            r#"
            UPDATE kid_profiles
            SET age_group = ?2, merged_interests = ?3, summary = ?4,
                gift_themes = ?5, updated_at = ?6
            WHERE session_id = ?1
            "#,
            params![
                session_id,
                insights.age_group.to_string(),
                serde_json::to_string(&insights.merged_interests)?,
                insights.summary.clone(),
                serde_json::to_string(&insights.gift_themes)?,
                Utc::now().to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    fn row_to_profile(row: &libsql::Row) -> Result<KidProfile> {
        let age_group: Option<String> = row.get(6)?;
        let merged_interests: Option<String> = row.get(7)?;
        let summary: Option<String> = row.get(8)?;
        let gift_themes: Option<String> = row.get(9)?;

        let insights = match (
            age_group.and_then(|s| s.parse::<AgeGroup>().ok()),
            summary,
        ) {
            (Some(age_group), Some(summary)) => Some(ProfileInsights {
                age_group,
                merged_interests: decode_json_list(merged_interests.as_deref()),
                summary,
                gift_themes: decode_json_list(gift_themes.as_deref()),
            }),
            _ => None,
        };

        let interests: String = row.get(3)?;

        Ok(KidProfile {
            session_id: row.get(0)?,
            name: row.get(1)?,
            age: row.get::<i64>(2)?.clamp(0, u8::MAX as i64) as u8,
            interests: decode_json_list(Some(&interests)),
            budget: row.get::<String>(4)?.parse().unwrap_or_default(),
            notes: row.get(5)?,
            insights,
            created_at: parse_timestamp(&row.get::<String>(10)?),
            updated_at: parse_timestamp(&row.get::<String>(11)?),
        })
    }
}
