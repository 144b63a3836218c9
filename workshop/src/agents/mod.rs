//! The four pipeline stages.
//!
//! Each stage wraps one model call, deserializes the reply into a typed
//! response and validates it before handing it to the orchestrator.

pub mod gift_match;
pub mod image;
pub mod narration;
pub mod profile;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::error::WorkshopError;
use crate::llm::LlmProvider;
use crate::models::{
    AgentId, Gift, ImageAnalysisResult, KidProfile, ScoredRecommendation, SynthesizedProfile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFailureKind {
    /// The model call itself failed (network, provider, timeout).
    Execution,
    /// The model answered but the answer broke a stage invariant.
    Validation,
}

impl std::fmt::Display for StageFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execution => write!(f, "execution"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{agent} stage {kind} failure: {message}")]
pub struct StageFailure {
    pub agent: AgentId,
    pub kind: StageFailureKind,
    pub message: String,
}

impl StageFailure {
    pub fn execution(agent: AgentId, message: impl Into<String>) -> Self {
        Self {
            agent,
            kind: StageFailureKind::Execution,
            message: message.into(),
        }
    }

    pub fn validation(agent: AgentId, message: impl Into<String>) -> Self {
        Self {
            agent,
            kind: StageFailureKind::Validation,
            message: message.into(),
        }
    }

    /// Maps a provider error. Undecodable replies count as validation
    /// failures since the call itself went through.
    pub(crate) fn from_llm(agent: AgentId, error: WorkshopError) -> Self {
        match error {
            WorkshopError::LlmResponse(message) => Self::validation(agent, message),
            other => Self::execution(agent, other.to_string()),
        }
    }
}

/// The stage functions the orchestrator drives, in execution order.
#[async_trait]
pub trait AgentStages: Send + Sync {
    /// `None` when no photo is attached; the stage is then skipped.
    async fn analyze_image(
        &self,
        photo_url: Option<&str>,
    ) -> Result<Option<ImageAnalysisResult>, StageFailure>;

    async fn synthesize_profile(
        &self,
        profile: &KidProfile,
        analysis: Option<&ImageAnalysisResult>,
    ) -> Result<SynthesizedProfile, StageFailure>;

    /// `candidates` must already be compatible with the profile's age group
    /// and budget.
    async fn match_gifts(
        &self,
        profile: &SynthesizedProfile,
        candidates: &[Gift],
    ) -> Result<Vec<ScoredRecommendation>, StageFailure>;

    async fn narrate(
        &self,
        profile: &SynthesizedProfile,
        recommendations: &[ScoredRecommendation],
    ) -> Result<String, StageFailure>;
}

/// Production stages backed by the configured chat-completion provider.
#[derive(Clone)]
pub struct LlmStages {
    llm: LlmProvider,
    config: PipelineConfig,
}

impl LlmStages {
    pub fn new(llm: LlmProvider, config: PipelineConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl AgentStages for LlmStages {
    async fn analyze_image(
        &self,
        photo_url: Option<&str>,
    ) -> Result<Option<ImageAnalysisResult>, StageFailure> {
        image::analyze(&self.llm, photo_url).await
    }

    async fn synthesize_profile(
        &self,
        profile: &KidProfile,
        analysis: Option<&ImageAnalysisResult>,
    ) -> Result<SynthesizedProfile, StageFailure> {
        profile::synthesize(
            &self.llm,
            profile,
            analysis,
            self.config.image_confidence_threshold,
        )
        .await
    }

    async fn match_gifts(
        &self,
        profile: &SynthesizedProfile,
        candidates: &[Gift],
    ) -> Result<Vec<ScoredRecommendation>, StageFailure> {
        gift_match::match_gifts(&self.llm, profile, candidates, self.config.max_recommendations)
            .await
    }

    async fn narrate(
        &self,
        profile: &SynthesizedProfile,
        recommendations: &[ScoredRecommendation],
    ) -> Result<String, StageFailure> {
        narration::narrate(
            &self.llm,
            profile,
            recommendations,
            self.config.narration_max_chars,
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::LlmConfig;
    use crate::llm::LlmProvider;

    /// Provider pointed at `server`, answering every request with `content`.
    pub async fn mock_llm(server: &MockServer, content: &str) -> LlmProvider {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            })))
            .mount(server)
            .await;

        LlmProvider::new(Some(&LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            vision_model: None,
            api_key: Some("test-key".to_string()),
            base_url: Some(server.uri()),
            timeout_secs: 5,
            max_retries: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_display() {
        let failure = StageFailure::validation(AgentId::GiftMatch, "no candidates");
        assert_eq!(
            failure.to_string(),
            "gift-match stage validation failure: no candidates"
        );
    }

    #[test]
    fn test_undecodable_reply_is_validation_failure() {
        let failure = StageFailure::from_llm(
            AgentId::Profile,
            WorkshopError::LlmResponse("Failed to parse JSON response: eof".to_string()),
        );
        assert_eq!(failure.kind, StageFailureKind::Validation);

        let failure = StageFailure::from_llm(
            AgentId::Profile,
            WorkshopError::Llm("LLM request failed: connection refused".to_string()),
        );
        assert_eq!(failure.kind, StageFailureKind::Execution);
    }
}
