use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, info};

use crate::config::RetentionConfig;
use crate::db::DatabaseBackend;
use crate::error::Result;

/// Deletes sessions that were abandoned before reaching `completed`.
#[derive(Clone)]
pub struct RetentionManager {
    db: Arc<dyn DatabaseBackend>,
    max_age_days: u32,
    interval_secs: u64,
}

impl RetentionManager {
    pub fn new(db: Arc<dyn DatabaseBackend>, config: &RetentionConfig) -> Self {
        Self {
            db,
            max_age_days: config.max_age_days,
            interval_secs: config.check_interval_secs,
        }
    }

    /// Run a single sweep.
    ///
    /// Completed sessions are kept regardless of age, since they may be
    /// behind a share link, and so are sessions a run is working on. A
    /// failed delete is logged and the sweep moves on.
    /// Returns the number of sessions deleted.
    pub async fn run_once(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.max_age_days));
        info!(%cutoff, "Starting retention sweep");

        let candidates = self.db.get_retention_candidates(cutoff).await?;
        let count = candidates.len();

        if count == 0 {
            info!("No stale sessions to delete");
            return Ok(0);
        }

        debug!("Found {} stale sessions", count);

        let mut deleted = 0u64;
        let mut error_count = 0;

        for session in candidates {
            match self.db.delete_session(&session.id).await {
                Ok(true) => {
                    debug!(session_id = %session.id, status = %session.status, "Deleted stale session");
                    deleted += 1;
                }
                Ok(false) => {
                    debug!(session_id = %session.id, "Session already gone");
                }
                Err(e) => {
                    error!("Failed to delete session {}: {}", session.id, e);
                    error_count += 1;
                }
            }
        }

        info!(
            "Retention sweep complete: {} deleted, {} errors out of {} candidates",
            deleted, error_count, count
        );

        Ok(deleted)
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn max_age_days(&self) -> u32 {
        self.max_age_days
    }
}
