//! v1 Session handlers: the steps a user walks through before the pipeline
//! runs.

use axum::extract::{Path, State};
use validator::Validate;

use crate::api::v1::dto::{
    AttachPhotoRequest, NicePointsRequest, ProfileResponse, RecommendationResponse,
    SessionDetailResponse, SessionResponse, SubmitProfileRequest,
};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::{AppJson, AppState};
use crate::error::WorkshopError;
use crate::models::{
    normalize_interests, KidProfile, Session, SessionStatus, MAX_INTERESTS, MAX_NICE_POINTS,
};

/// Loads a session that is not in the middle of a pipeline run.
async fn editable_session(state: &AppState, id: &str) -> Result<Session, WorkshopError> {
    let session = state
        .db
        .get_session(id)
        .await?
        .ok_or_else(|| WorkshopError::NotFound(format!("Session {id} not found")))?;

    if session.status == SessionStatus::Processing || state.orchestrator.is_running(id) {
        return Err(WorkshopError::Conflict(
            "The workshop is running for this session, try again when it finishes".to_string(),
        ));
    }

    Ok(session)
}

/// Only `http` and `https` URLs are accepted.
fn parse_photo_url(raw: &str) -> Result<url::Url, WorkshopError> {
    let url = url::Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(WorkshopError::Validation(format!(
            "Unsupported photo URL scheme: {other}"
        ))),
    }
}

/// `POST /api/v1/sessions`
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    operation_id = "sessions.create",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
    )
)]
pub async fn create_session(State(state): State<AppState>) -> ApiResponse<SessionResponse> {
    let session = Session::new();
    if let Err(e) = state.db.create_session(&session).await {
        return e.into();
    }
    tracing::info!(session_id = %session.id, "Session created");
    ApiResponse::created(SessionResponse::from(session))
}

/// `GET /api/v1/sessions/{sessionId}`
///
/// Returns the session together with its questionnaire answers and the
/// recommendations of the last successful run.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}",
    tag = "sessions",
    operation_id = "sessions.get",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session found", body = SessionDetailResponse),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<SessionDetailResponse> {
    let session = match state.db.get_session(&id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return ApiResponse::error(ErrorCode::NotFound, format!("Session {id} not found"))
        }
        Err(e) => return e.into(),
    };

    let profile = match state.db.get_profile(&id).await {
        Ok(profile) => profile,
        Err(e) => return e.into(),
    };

    let recommendations = match state.db.get_recommendations(&id).await {
        Ok(recs) => recs,
        Err(e) => return e.into(),
    };

    ApiResponse::success(SessionDetailResponse {
        session: session.into(),
        profile: profile.map(ProfileResponse::from),
        recommendations: RecommendationResponse::ranked(recommendations),
    })
}

/// `PUT /api/v1/sessions/{sessionId}/photo`
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{sessionId}/photo",
    tag = "sessions",
    operation_id = "sessions.attachPhoto",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = AttachPhotoRequest,
    responses(
        (status = 200, description = "Photo attached", body = SessionResponse),
        (status = 400, description = "Invalid photo URL", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Pipeline running", body = ApiError),
    )
)]
pub async fn attach_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<AttachPhotoRequest>,
) -> ApiResponse<SessionResponse> {
    let photo_url = match parse_photo_url(&req.photo_url) {
        Ok(url) => url,
        Err(e) => return e.into(),
    };

    let mut session = match editable_session(&state, &id).await {
        Ok(session) => session,
        Err(e) => return e.into(),
    };

    session.photo_url = Some(photo_url.to_string());
    if session.status == SessionStatus::Created {
        session.status = SessionStatus::PhotoUploaded;
    }

    if let Err(e) = state.db.update_session(&session).await {
        return e.into();
    }

    ApiResponse::success(SessionResponse::from(session))
}

/// `PUT /api/v1/sessions/{sessionId}/profile`
///
/// Upserts the questionnaire answers. Derived insights from a previous run
/// are cleared and recomputed on the next run.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{sessionId}/profile",
    tag = "sessions",
    operation_id = "sessions.submitProfile",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = SubmitProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ProfileResponse),
        (status = 400, description = "Invalid answers", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Pipeline running", body = ApiError),
    )
)]
pub async fn submit_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<SubmitProfileRequest>,
) -> ApiResponse<ProfileResponse> {
    if let Err(e) = req.validate() {
        return ApiResponse::error(ErrorCode::InvalidRequest, e.to_string());
    }

    let name = req.name.trim();
    if name.is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Name cannot be empty");
    }

    let interests = normalize_interests(&req.interests, MAX_INTERESTS);
    if interests.is_empty() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "At least one non-empty interest is required",
        );
    }

    let mut session = match editable_session(&state, &id).await {
        Ok(session) => session,
        Err(e) => return e.into(),
    };

    let mut profile = KidProfile::new(id.clone(), name.to_string(), req.age, interests);
    profile.budget = req.budget.into();
    profile.notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    if let Err(e) = state.db.upsert_profile(&profile).await {
        return e.into();
    }

    session.status = SessionStatus::ProfileSubmitted;
    session.failure_reason = None;
    if let Err(e) = state.db.update_session(&session).await {
        return e.into();
    }

    tracing::info!(session_id = %id, age = profile.age, "Profile submitted");
    ApiResponse::success(ProfileResponse::from(profile))
}

/// `PUT /api/v1/sessions/{sessionId}/nice-points`
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{sessionId}/nice-points",
    tag = "sessions",
    operation_id = "sessions.setNicePoints",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = NicePointsRequest,
    responses(
        (status = 200, description = "Score saved", body = SessionResponse),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Pipeline running", body = ApiError),
    )
)]
pub async fn set_nice_points(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<NicePointsRequest>,
) -> ApiResponse<SessionResponse> {
    let mut session = match editable_session(&state, &id).await {
        Ok(session) => session,
        Err(e) => return e.into(),
    };

    // clamped in i64, so the narrowing cast cannot overflow
    session.nice_points = req.nice_points.clamp(0, i64::from(MAX_NICE_POINTS)) as i32;

    if let Err(e) = state.db.update_session(&session).await {
        return e.into();
    }

    ApiResponse::success(SessionResponse::from(session))
}
