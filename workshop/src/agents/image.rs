use serde::Deserialize;

use crate::llm::{prompts, LlmProvider};
use crate::models::{normalize_interests, AgentId, ImageAnalysisResult, MAX_AGE, MAX_INTERESTS};

use super::StageFailure;

/// Raw vision reply, before range checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnalysisResponse {
    #[serde(default)]
    estimated_age: Option<i64>,
    #[serde(default)]
    visible_interests: Vec<String>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    environment: Vec<String>,
    confidence: f64,
}

pub(crate) async fn analyze(
    llm: &LlmProvider,
    photo_url: Option<&str>,
) -> Result<Option<ImageAnalysisResult>, StageFailure> {
    let Some(photo_url) = photo_url.map(str::trim).filter(|url| !url.is_empty()) else {
        tracing::debug!("No photo attached, skipping image analysis");
        return Ok(None);
    };

    let prompt = prompts::image_analysis_prompt();
    let response: ImageAnalysisResponse = llm
        .complete_vision_structured(&prompt, photo_url)
        .await
        .map_err(|e| StageFailure::from_llm(AgentId::Image, e))?;

    validate(response).map(Some)
}

fn validate(response: ImageAnalysisResponse) -> Result<ImageAnalysisResult, StageFailure> {
    if !response.confidence.is_finite() || !(0.0..=1.0).contains(&response.confidence) {
        return Err(StageFailure::validation(
            AgentId::Image,
            format!("confidence {} is outside 0..=1", response.confidence),
        ));
    }

    let estimated_age = match response.estimated_age {
        None => None,
        Some(age) if (0..=MAX_AGE as i64).contains(&age) => Some(age as u8),
        Some(age) => {
            return Err(StageFailure::validation(
                AgentId::Image,
                format!("estimated age {age} is outside 0..={MAX_AGE}"),
            ))
        }
    };

    Ok(ImageAnalysisResult {
        estimated_age,
        visible_interests: normalize_interests(response.visible_interests, MAX_INTERESTS),
        colors: normalize_interests(response.colors, MAX_INTERESTS),
        environment: normalize_interests(response.environment, MAX_INTERESTS),
        confidence: response.confidence as f32,
    })
}
