use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

/// Lifecycle of one run through the workshop.
///
/// `created -> photo_uploaded -> profile_submitted -> processing -> completed | failed`.
/// The photo step is optional, and a failed or completed session can be
/// processed again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Created,
    PhotoUploaded,
    ProfileSubmitted,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Whether the pipeline has finished with this session, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::PhotoUploaded => write!(f, "photo_uploaded"),
            Self::ProfileSubmitted => write!(f, "profile_submitted"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "photo_uploaded" => Ok(Self::PhotoUploaded),
            "profile_submitted" => Ok(Self::ProfileSubmitted),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown session status: {s}")),
        }
    }
}

pub const MAX_NICE_POINTS: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    pub photo_url: Option<String>,
    pub nice_points: i32,
    pub narration: Option<String>,
    pub failure_reason: Option<String>,
    pub share_slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(nanoid!())
    }

    pub fn with_id(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: SessionStatus::default(),
            photo_url: None,
            nice_points: 0,
            narration: None,
            failure_reason: None,
            share_slug: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            SessionStatus::Created,
            SessionStatus::PhotoUploaded,
            SessionStatus::ProfileSubmitted,
            SessionStatus::Processing,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            let parsed: SessionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_value(SessionStatus::ProfileSubmitted).unwrap();
        assert_eq!(json, "profile_submitted");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("archived".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_new_session_starts_created() {
        let session = Session::new();
        assert_eq!(session.status, SessionStatus::Created);
        assert_eq!(session.id.len(), 21);
        assert_eq!(session.nice_points, 0);
        assert!(session.completed_at.is_none());
    }
}
