use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{Session, SessionStatus};

use super::{parse_optional_timestamp, parse_timestamp};

const SESSION_COLUMNS: &str = "id, status, photo_url, nice_points, narration, failure_reason, \
     share_slug, created_at, updated_at, completed_at";

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create(conn: &Connection, session: &Session) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO sessions (
                id, status, photo_url, nice_points, narration, failure_reason,
                share_slug, created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                session.id.clone(),
                session.status.to_string(),
                session.photo_url.clone(),
                session.nice_points,
                session.narration.clone(),
                session.failure_reason.clone(),
                session.share_slug.clone(),
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
                session.completed_at.map(|dt| dt.to_rfc3339()),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_session(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_share_slug(conn: &Connection, slug: &str) -> Result<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE share_slug = ?1");
        let mut rows = conn.query(&sql, params![slug]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_session(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn update(conn: &Connection, session: &Session) -> Result<()> {
        conn.execute(
            r#"
            UPDATE sessions SET
                status = ?2,
                photo_url = ?3,
                nice_points = ?4,
                narration = ?5,
                failure_reason = ?6,
                share_slug = ?7,
                updated_at = ?8,
                completed_at = ?9
            WHERE id = ?1
            "#,
            params![
                session.id.clone(),
                session.status.to_string(),
                session.photo_url.clone(),
                session.nice_points,
                session.narration.clone(),
                session.failure_reason.clone(),
                session.share_slug.clone(),
                Utc::now().to_rfc3339(),
                session.completed_at.map(|dt| dt.to_rfc3339()),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn update_status(
        conn: &Connection,
        id: &str,
        status: SessionStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            r#"
            UPDATE sessions
            SET status = ?2, failure_reason = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
            params![id, status.to_string(), failure_reason, Utc::now().to_rfc3339()],
        )
        .await?;

        Ok(())
    }

    /// Sessions created before `before` that never reached `completed`.
    /// A session moved to `processing` after `before` belongs to a live run
    /// and is left alone.
    pub async fn get_retention_candidates(
        conn: &Connection,
        before: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE status != 'completed' AND created_at < ?1 \
               AND NOT (status = 'processing' AND updated_at >= ?1) \
             ORDER BY created_at ASC"
        );
        let mut rows = conn.query(&sql, params![before.to_rfc3339()]).await?;

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(Self::row_to_session(&row)?);
        }
        Ok(sessions)
    }

    /// Deletes the session and its dependent rows in one transaction.
    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let tx = conn.transaction().await?;
        tx.execute(
            "DELETE FROM recommendations WHERE session_id = ?1",
            params![id],
        )
        .await?;
        tx.execute("DELETE FROM kid_profiles WHERE session_id = ?1", params![id])
            .await?;
        let rows_affected = tx
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])
            .await?;
        tx.commit().await?;

        Ok(rows_affected > 0)
    }

    fn row_to_session(row: &libsql::Row) -> Result<Session> {
        Ok(Session {
            id: row.get(0)?,
            status: row
                .get::<String>(1)?
                .parse()
                .unwrap_or(SessionStatus::Failed),
            photo_url: row.get(2)?,
            nice_points: row.get::<i64>(3)? as i32,
            narration: row.get(4)?,
            failure_reason: row.get(5)?,
            share_slug: row.get(6)?,
            created_at: parse_timestamp(&row.get::<String>(7)?),
            updated_at: parse_timestamp(&row.get::<String>(8)?),
            completed_at: parse_optional_timestamp(row.get::<Option<String>>(9)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;
    use chrono::Duration;

    async fn setup_test_db() -> Connection {
        let conn = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap()
            .connect()
            .unwrap();
        init_schema(&conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let conn = setup_test_db().await;
        let session = Session::new();
        SessionRepository::create(&conn, &session).await.unwrap();

        let loaded = SessionRepository::get_by_id(&conn, &session.id)
            .await
            .unwrap()
            .expect("session should exist");
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.status, SessionStatus::Created);
        assert!(loaded.photo_url.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_session_returns_none() {
        let conn = setup_test_db().await;
        let loaded = SessionRepository::get_by_id(&conn, "nope").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_update_status_records_failure_reason() {
        let conn = setup_test_db().await;
        let session = Session::new();
        SessionRepository::create(&conn, &session).await.unwrap();

        SessionRepository::update_status(
            &conn,
            &session.id,
            SessionStatus::Failed,
            Some("gift-match: no candidates"),
        )
        .await
        .unwrap();

        let loaded = SessionRepository::get_by_id(&conn, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, SessionStatus::Failed);
        assert_eq!(
            loaded.failure_reason.as_deref(),
            Some("gift-match: no candidates")
        );
    }

    #[tokio::test]
    async fn test_retention_candidates_skip_completed_and_recent() {
        let conn = setup_test_db().await;
        let old = Utc::now() - Duration::days(10);

        let mut stale = Session::with_id("stale".to_string());
        stale.created_at = old;
        let mut finished = Session::with_id("finished".to_string());
        finished.created_at = old;
        finished.status = SessionStatus::Completed;
        let fresh = Session::with_id("fresh".to_string());
        let mut running = Session::with_id("running".to_string());
        running.created_at = old;
        running.status = SessionStatus::Processing;
        let mut abandoned_run = Session::with_id("abandoned-run".to_string());
        abandoned_run.created_at = old;
        abandoned_run.updated_at = old;
        abandoned_run.status = SessionStatus::Processing;

        for session in [&stale, &finished, &fresh, &running, &abandoned_run] {
            SessionRepository::create(&conn, session).await.unwrap();
        }

        let cutoff = Utc::now() - Duration::days(7);
        let candidates = SessionRepository::get_retention_candidates(&conn, cutoff)
            .await
            .unwrap();
        let mut ids: Vec<&str> = candidates.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["abandoned-run", "stale"]);
    }

    #[tokio::test]
    async fn test_delete_removes_session() {
        let conn = setup_test_db().await;
        let session = Session::new();
        SessionRepository::create(&conn, &session).await.unwrap();

        assert!(SessionRepository::delete(&conn, &session.id).await.unwrap());
        assert!(!SessionRepository::delete(&conn, &session.id).await.unwrap());
        assert!(SessionRepository::get_by_id(&conn, &session.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_lookup_by_share_slug() {
        let conn = setup_test_db().await;
        let mut session = Session::new();
        session.share_slug = Some("jolly-slug".to_string());
        SessionRepository::create(&conn, &session).await.unwrap();

        let loaded = SessionRepository::get_by_share_slug(&conn, "jolly-slug")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, session.id);
    }
}
