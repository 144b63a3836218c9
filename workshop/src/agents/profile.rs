use serde::Deserialize;

use crate::llm::{prompts, LlmProvider};
use crate::models::{
    normalize_interests, AgeGroup, AgentId, ImageAnalysisResult, KidProfile, SynthesizedProfile,
    MAX_AGE, MAX_INTERESTS,
};

use super::StageFailure;

const MAX_GIFT_THEMES: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSynthesisResponse {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    gift_themes: Vec<String>,
}

/// Form interests first, then photo interests when the photo is trusted.
pub fn merge_interests(
    interests: &[String],
    analysis: Option<&ImageAnalysisResult>,
    confidence_threshold: f32,
) -> Vec<String> {
    let photo_interests = trusted_analysis(analysis, confidence_threshold)
        .map(|a| a.visible_interests.as_slice())
        .unwrap_or_default();

    normalize_interests(
        interests.iter().chain(photo_interests.iter()),
        MAX_INTERESTS,
    )
}

fn trusted_analysis(
    analysis: Option<&ImageAnalysisResult>,
    confidence_threshold: f32,
) -> Option<&ImageAnalysisResult> {
    analysis.filter(|a| a.confidence >= confidence_threshold)
}

pub(crate) async fn synthesize(
    llm: &LlmProvider,
    profile: &KidProfile,
    analysis: Option<&ImageAnalysisResult>,
    confidence_threshold: f32,
) -> Result<SynthesizedProfile, StageFailure> {
    if profile.age > MAX_AGE {
        return Err(StageFailure::validation(
            AgentId::Profile,
            format!("age {} is outside 0..={MAX_AGE}", profile.age),
        ));
    }

    // the form age always wins over a photo estimate
    let age_group = AgeGroup::from_age(profile.age);
    let interests = merge_interests(&profile.interests, analysis, confidence_threshold);
    let trusted = trusted_analysis(analysis, confidence_threshold);

    if analysis.is_some() && trusted.is_none() {
        tracing::debug!(
            session_id = %profile.session_id,
            "Photo analysis below confidence threshold, ignoring it"
        );
    }

    let prompt = prompts::profile_synthesis_prompt(profile, &interests, trusted);
    let response: ProfileSynthesisResponse = llm
        .complete_structured(&prompt, Some(prompts::WORKSHOP_SYSTEM_PROMPT))
        .await
        .map_err(|e| StageFailure::from_llm(AgentId::Profile, e))?;

    let summary = response.summary.trim().to_string();
    if summary.is_empty() {
        return Err(StageFailure::validation(
            AgentId::Profile,
            "model returned an empty summary",
        ));
    }

    let gift_themes = normalize_interests(response.gift_themes, MAX_GIFT_THEMES);
    if gift_themes.is_empty() {
        return Err(StageFailure::validation(
            AgentId::Profile,
            "model returned no gift themes",
        ));
    }

    Ok(SynthesizedProfile {
        session_id: profile.session_id.clone(),
        name: profile.name.clone(),
        age: profile.age,
        age_group,
        budget: profile.budget,
        interests,
        summary,
        gift_themes,
        notes: profile.notes.clone(),
    })
}
