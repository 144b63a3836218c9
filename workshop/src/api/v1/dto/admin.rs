//! Admin DTOs for the v1 API.

use serde::Serialize;

/// Response for `POST /v1/admin/retention:run`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRunResponse {
    /// Sessions deleted in this sweep.
    pub sessions_deleted: u64,
    /// Unfinished sessions older than this were eligible.
    pub max_age_days: u32,
}
