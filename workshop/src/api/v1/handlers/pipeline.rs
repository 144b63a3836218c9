//! v1 pipeline trigger: runs the agents for a session and streams their
//! progress as server-sent events.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;

use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::models::{AgentEvent, AgentId};
use crate::pipeline::{BestEffortSink, PipelineError};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `POST /api/v1/sessions/{sessionId}/pipeline`
///
/// Opens an SSE stream of `AgentEvent`s, one `data:` frame per event. The
/// stream ends after a `complete` or `error` event. Problems found before the
/// run starts are answered with a regular JSON error instead.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/pipeline",
    tag = "pipeline",
    operation_id = "pipeline.run",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = String),
        (status = 400, description = "Profile not submitted yet", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "A run is already in progress", body = ApiError),
    )
)]
pub async fn run_pipeline(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.db.get_session(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiResponse::<()>::error(ErrorCode::NotFound, format!("Session {id} not found"))
                .into_response()
        }
        Err(e) => return ApiResponse::<()>::from(e).into_response(),
    }

    match state.db.get_profile(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiResponse::<()>::error(
                ErrorCode::InvalidRequest,
                "Submit the questionnaire before starting the workshop",
            )
            .into_response()
        }
        Err(e) => return ApiResponse::<()>::from(e).into_response(),
    }

    if state.orchestrator.is_running(&id) {
        return ApiResponse::<()>::error(
            ErrorCode::Conflict,
            format!("A workshop run is already in progress for session {id}"),
        )
        .into_response();
    }

    let (tx, rx) = mpsc::channel::<AgentEvent>(state.config.pipeline.event_channel_capacity.max(1));
    spawn_run(&state, id, tx);

    event_stream(rx)
}

/// Frames events as SSE until a terminal event or until every sender is gone.
fn event_stream(mut rx: mpsc::Receiver<AgentEvent>) -> Response {
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match Event::default().json_data(&event) {
                Ok(frame) => yield Ok::<_, Infallible>(frame),
                Err(e) => tracing::error!(error = %e, "Failed to encode agent event"),
            }
            if event.is_terminal() {
                break;
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response()
}

/// Runs the orchestrator in the background, feeding `tx`. The stream closes
/// once the run returns and every sender has been dropped.
fn spawn_run(state: &AppState, session_id: String, tx: mpsc::Sender<AgentEvent>) {
    let orchestrator = state.orchestrator.clone();
    let cancel = state.shutdown.child_token();
    let continue_on_disconnect = state.config.pipeline.continue_on_disconnect;

    tokio::spawn(async move {
        let preflight_tx = tx.clone();
        let result = if continue_on_disconnect {
            let sink = BestEffortSink::new(tx);
            orchestrator.run(&session_id, &sink, &cancel).await
        } else {
            orchestrator.run(&session_id, &tx, &cancel).await
        };

        match result {
            Ok(_) => {}
            // these fail before any event is emitted, so the stream would
            // otherwise close empty
            Err(
                error @ (PipelineError::AlreadyRunning(_)
                | PipelineError::SessionNotFound(_)
                | PipelineError::ProfileMissing(_)),
            ) => {
                tracing::warn!(session_id = %session_id, error = %error, "Pipeline run rejected");
                let event = AgentEvent::failed(AgentId::Image, error.client_message());
                let _ = preflight_tx.send(event).await;
            }
            Err(error) => {
                tracing::debug!(session_id = %session_id, error = %error, "Pipeline stream finished with error");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_stream_ends_at_terminal_event() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(AgentEvent::detail(AgentId::Profile, "thinking")).await.unwrap();
        tx.send(AgentEvent::failed(AgentId::Profile, "boom")).await.unwrap();
        tx.send(AgentEvent::detail(AgentId::GiftMatch, "late")).await.unwrap();

        // `tx` stays alive, so only the terminal event can close the body
        let body = event_stream(rx).into_body();
        let bytes = tokio::time::timeout(
            Duration::from_secs(5),
            axum::body::to_bytes(body, usize::MAX),
        )
        .await
        .expect("stream closes after the error event")
        .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert_eq!(text.matches("data: ").count(), 2);
        assert!(!text.contains("late"));
        drop(tx);
    }
}
