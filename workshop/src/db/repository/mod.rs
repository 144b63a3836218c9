mod gifts;
mod profiles;
mod recommendations;
mod sessions;

pub use gifts::GiftRepository;
pub use profiles::ProfileRepository;
pub use recommendations::RecommendationRepository;
pub use sessions::SessionRepository;

use chrono::{DateTime, Utc};

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_optional_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decode a JSON string array column, treating NULL or garbage as empty.
pub(crate) fn decode_json_list(value: Option<&str>) -> Vec<String> {
    value
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
