use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per run through the workshop
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'created',
            photo_url TEXT,
            nice_points INTEGER NOT NULL DEFAULT 0,
            narration TEXT,
            failure_reason TEXT,
            share_slug TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
        CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_share_slug
            ON sessions(share_slug) WHERE share_slug IS NOT NULL;

        -- Questionnaire answers, one-to-one with sessions
        CREATE TABLE IF NOT EXISTS kid_profiles (
            session_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            interests TEXT NOT NULL DEFAULT '[]',
            budget TEXT NOT NULL DEFAULT 'low',
            notes TEXT,
            age_group TEXT,
            merged_interests TEXT,
            summary TEXT,
            gift_themes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
        );

        -- Gift catalog
        CREATE TABLE IF NOT EXISTS gifts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price_cents INTEGER NOT NULL DEFAULT 0,
            budget TEXT NOT NULL,
            age_groups TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        -- Ranked output of the last successful pipeline run
        CREATE TABLE IF NOT EXISTS recommendations (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            gift_id TEXT NOT NULL,
            rank INTEGER NOT NULL,
            score REAL NOT NULL,
            reasoning TEXT NOT NULL DEFAULT '',
            matched_interests TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
            FOREIGN KEY (gift_id) REFERENCES gifts(id) ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_recommendations_session_rank
            ON recommendations(session_id, rank);
        "#,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();

        init_schema(&conn).await.unwrap();
        init_schema(&conn).await.unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
                (),
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            tables.push(row.get::<String>(0).unwrap());
        }

        for expected in ["gifts", "kid_profiles", "recommendations", "sessions"] {
            assert!(
                tables.iter().any(|t| t == expected),
                "missing table {expected}, got {tables:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_share_slug_is_unique() {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        init_schema(&conn).await.unwrap();

        let insert = "INSERT INTO sessions (id, share_slug, created_at, updated_at) VALUES (?1, ?2, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')";
        conn.execute(insert, libsql::params!["s1", "slug"]).await.unwrap();
        conn.execute(insert, libsql::params!["s2", libsql::Value::Null])
            .await
            .unwrap();
        conn.execute(insert, libsql::params!["s3", libsql::Value::Null])
            .await
            .unwrap();

        let duplicate = conn.execute(insert, libsql::params!["s4", "slug"]).await;
        assert!(duplicate.is_err(), "duplicate share slug must be rejected");
    }
}
