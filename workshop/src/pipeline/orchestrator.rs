use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::agents::{AgentStages, StageFailure};
use crate::config::PipelineConfig;
use crate::db::DatabaseBackend;
use crate::error::WorkshopError;
use crate::models::{
    AgentEvent, AgentId, ImageAnalysisResult, KidProfile, ScoredRecommendation, Session,
    SessionStatus, SynthesizedProfile,
};

use super::guard::RunRegistry;
use super::sink::EventSink;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} has no submitted profile")]
    ProfileMissing(String),

    #[error("a pipeline run is already in progress for session {0}")]
    AlreadyRunning(String),

    #[error(transparent)]
    Stage(#[from] StageFailure),

    #[error("event stream closed by the client")]
    Transport,

    #[error("pipeline run cancelled")]
    Cancelled,

    #[error("persistence failure: {0}")]
    Persistence(#[from] WorkshopError),
}

impl PipelineError {
    /// Message shown to the client on the `error` event.
    pub fn client_message(&self) -> String {
        match self {
            Self::Stage(failure) => failure.message.clone(),
            Self::Persistence(_) => "Failed to save pipeline progress".to_string(),
            Self::Cancelled => "Pipeline run was cancelled".to_string(),
            other => other.to_string(),
        }
    }

    /// Stored on the session when the run fails.
    fn failure_reason(&self) -> String {
        match self {
            Self::Stage(failure) => format!("{}: {}", failure.agent, failure.message),
            Self::Cancelled => "cancelled".to_string(),
            Self::Transport => "client disconnected".to_string(),
            other => other.to_string(),
        }
    }
}

/// Aggregate result of a successful run, also the `complete` event payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub session_id: String,
    pub profile: SynthesizedProfile,
    pub recommendations: Vec<ScoredRecommendation>,
    pub narration: String,
}

/// Drives the four stages for one session at a time, in fixed order,
/// reporting every transition to an [`EventSink`].
pub struct AgentOrchestrator {
    db: Arc<dyn DatabaseBackend>,
    stages: Arc<dyn AgentStages>,
    runs: RunRegistry,
    stage_timeout: Duration,
}

impl AgentOrchestrator {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        stages: Arc<dyn AgentStages>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            db,
            stages,
            runs: RunRegistry::new(),
            stage_timeout: Duration::from_secs(config.stage_timeout_secs.max(1)),
        }
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.runs.is_running(session_id)
    }

    pub async fn run(
        &self,
        session_id: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let _guard = self
            .runs
            .try_acquire(session_id)
            .ok_or_else(|| PipelineError::AlreadyRunning(session_id.to_string()))?;

        let (session, profile) = match self.start_run(session_id).await {
            Ok(inputs) => inputs,
            // nothing has been streamed yet, report it against the first stage
            Err(error @ PipelineError::Persistence(_)) => {
                return self.fail(AgentId::Image, error, sink).await
            }
            Err(error) => return Err(error),
        };
        tracing::info!(session_id, "Pipeline run started");

        let result = self
            .run_stages(session_id, session.photo_url.as_deref(), &profile, sink, cancel)
            .await;

        match &result {
            Ok(output) => {
                tracing::info!(
                    session_id,
                    recommendations = output.recommendations.len(),
                    "Pipeline run completed"
                );
            }
            Err(error) => {
                tracing::warn!(session_id, error = %error, "Pipeline run failed");
                let reason = error.failure_reason();
                if let Err(db_error) = self
                    .db
                    .update_session_status(session_id, SessionStatus::Failed, Some(&reason))
                    .await
                {
                    tracing::error!(session_id, error = %db_error, "Failed to mark session failed");
                }
            }
        }

        result
    }

    /// Loads the run inputs and moves the session to `processing`.
    async fn start_run(
        &self,
        session_id: &str,
    ) -> Result<(Session, KidProfile), PipelineError> {
        let session = self
            .db
            .get_session(session_id)
            .await?
            .ok_or_else(|| PipelineError::SessionNotFound(session_id.to_string()))?;
        let profile = self
            .db
            .get_profile(session_id)
            .await?
            .ok_or_else(|| PipelineError::ProfileMissing(session_id.to_string()))?;

        self.db
            .update_session_status(session_id, SessionStatus::Processing, None)
            .await?;
        Ok((session, profile))
    }

    async fn run_stages(
        &self,
        session_id: &str,
        photo_url: Option<&str>,
        profile: &KidProfile,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        // image
        let agent = AgentId::Image;
        self.start_stage(agent, sink).await?;
        let detail = if photo_url.is_some() {
            "Looking closely at the photo"
        } else {
            "No photo attached, skipping photo analysis"
        };
        emit(sink, AgentEvent::detail(agent, detail)).await?;
        let analysis: Option<ImageAnalysisResult> = self
            .await_stage(agent, sink, cancel, self.stages.analyze_image(photo_url))
            .await?;
        let image_payload = match &analysis {
            Some(analysis) => serde_json::to_value(analysis).unwrap_or_default(),
            None => json!({ "skipped": true }),
        };
        self.finish_stage(agent, image_payload, sink).await?;

        // profile
        let agent = AgentId::Profile;
        self.start_stage(agent, sink).await?;
        emit(sink, AgentEvent::detail(agent, "Getting to know the child")).await?;
        let synthesized = self
            .await_stage(
                agent,
                sink,
                cancel,
                self.stages.synthesize_profile(profile, analysis.as_ref()),
            )
            .await?;
        if let Err(error) = self
            .db
            .save_profile_insights(session_id, &synthesized.insights())
            .await
        {
            return self.fail(agent, error.into(), sink).await;
        }
        self.finish_stage(agent, serde_json::to_value(&synthesized).unwrap_or_default(), sink)
            .await?;

        // gift-match
        let agent = AgentId::GiftMatch;
        self.start_stage(agent, sink).await?;
        let candidates = match self
            .db
            .list_gifts(Some(synthesized.age_group), Some(synthesized.budget))
            .await
        {
            Ok(candidates) => candidates,
            Err(error) => return self.fail(agent, error.into(), sink).await,
        };
        emit(
            sink,
            AgentEvent::detail(agent, format!("Scoring {} candidate gifts", candidates.len())),
        )
        .await?;
        let recommendations = self
            .await_stage(
                agent,
                sink,
                cancel,
                self.stages.match_gifts(&synthesized, &candidates),
            )
            .await?;
        self.finish_stage(
            agent,
            serde_json::to_value(&recommendations).unwrap_or_default(),
            sink,
        )
        .await?;

        // narration
        let agent = AgentId::Narration;
        self.start_stage(agent, sink).await?;
        emit(sink, AgentEvent::detail(agent, "Writing the story")).await?;
        let narration = self
            .await_stage(
                agent,
                sink,
                cancel,
                self.stages.narrate(&synthesized, &recommendations),
            )
            .await?;
        if cancel.is_cancelled() {
            return self.fail(agent, PipelineError::Cancelled, sink).await;
        }
        if let Err(error) = self
            .db
            .save_pipeline_result(session_id, &recommendations, &narration)
            .await
        {
            return self.fail(agent, error.into(), sink).await;
        }

        let output = PipelineOutput {
            session_id: session_id.to_string(),
            profile: synthesized,
            recommendations,
            narration,
        };

        // the result is persisted, a listener leaving now no longer matters
        let closing = [
            AgentEvent::output(agent, json!({ "text": output.narration })),
            AgentEvent::completed(agent),
            AgentEvent::complete(serde_json::to_value(&output).unwrap_or_default()),
        ];
        for event in closing {
            if sink.emit(event).await.is_err() {
                tracing::debug!(session_id, "Listener left before the final events");
                break;
            }
        }

        Ok(output)
    }

    async fn start_stage(&self, agent: AgentId, sink: &dyn EventSink) -> Result<(), PipelineError> {
        tracing::debug!(agent = %agent, "Stage started");
        emit(sink, AgentEvent::running(agent)).await
    }

    async fn finish_stage(
        &self,
        agent: AgentId,
        payload: Value,
        sink: &dyn EventSink,
    ) -> Result<(), PipelineError> {
        emit(sink, AgentEvent::output(agent, payload)).await?;
        emit(sink, AgentEvent::completed(agent)).await?;
        tracing::debug!(agent = %agent, "Stage completed");
        Ok(())
    }

    /// Awaits a stage, racing it against cancellation and the stage timeout.
    async fn await_stage<T, F>(
        &self,
        agent: AgentId,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
        stage: F,
    ) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, StageFailure>>,
    {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = tokio::time::timeout(self.stage_timeout, stage) => match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(failure)) => Err(PipelineError::Stage(failure)),
                Err(_) => Err(PipelineError::Stage(StageFailure::execution(
                    agent,
                    format!("stage timed out after {}s", self.stage_timeout.as_secs()),
                ))),
            },
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(error) => self.fail(agent, error, sink).await,
        }
    }

    /// Reports a terminal failure on the stream and returns it.
    async fn fail<T>(
        &self,
        agent: AgentId,
        error: PipelineError,
        sink: &dyn EventSink,
    ) -> Result<T, PipelineError> {
        if let PipelineError::Persistence(inner) = &error {
            tracing::error!(agent = %agent, error = %inner, "Pipeline checkpoint failed");
        }
        if sink
            .emit(AgentEvent::failed(agent, error.client_message()))
            .await
            .is_err()
        {
            tracing::debug!(agent = %agent, "Listener gone, failure not delivered");
        }
        Err(error)
    }
}

async fn emit(sink: &dyn EventSink, event: AgentEvent) -> Result<(), PipelineError> {
    sink.emit(event).await.map_err(|_| PipelineError::Transport)
}
