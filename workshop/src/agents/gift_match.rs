use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::llm::{prompts, LlmProvider};
use crate::models::{rank_recommendations, AgentId, Gift, ScoredRecommendation, SynthesizedProfile};

use super::StageFailure;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    gift_id: String,
    score: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    matched_interests: Vec<String>,
}

/// Models sometimes return `[...]` and sometimes `{"recommendations": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GiftMatchResponse {
    Wrapped { recommendations: Vec<RawRecommendation> },
    Bare(Vec<RawRecommendation>),
}

impl GiftMatchResponse {
    fn into_inner(self) -> Vec<RawRecommendation> {
        match self {
            Self::Wrapped { recommendations } => recommendations,
            Self::Bare(recommendations) => recommendations,
        }
    }
}

/// Catalog entries matching the profile's age group and budget, in catalog
/// order.
pub fn compatible_candidates(profile: &SynthesizedProfile, catalog: &[Gift]) -> Vec<Gift> {
    catalog
        .iter()
        .filter(|gift| gift.is_compatible(profile.age_group, profile.budget))
        .cloned()
        .collect()
}

pub(crate) async fn match_gifts(
    llm: &LlmProvider,
    profile: &SynthesizedProfile,
    candidates: &[Gift],
    max_recommendations: usize,
) -> Result<Vec<ScoredRecommendation>, StageFailure> {
    let candidates = compatible_candidates(profile, candidates);
    if candidates.is_empty() {
        return Err(StageFailure::validation(
            AgentId::GiftMatch,
            format!(
                "no catalog gifts fit age group {} and budget {}",
                profile.age_group, profile.budget
            ),
        ));
    }

    let prompt = prompts::gift_match_prompt(profile, &candidates);
    let response: GiftMatchResponse = llm
        .complete_structured(&prompt, Some(prompts::WORKSHOP_SYSTEM_PROMPT))
        .await
        .map_err(|e| StageFailure::from_llm(AgentId::GiftMatch, e))?;

    build_recommendations(
        profile,
        &candidates,
        response.into_inner(),
        max_recommendations,
    )
}

/// Turn raw model scores into the ranked, validated recommendation list.
fn build_recommendations(
    profile: &SynthesizedProfile,
    candidates: &[Gift],
    raw: Vec<RawRecommendation>,
    max_recommendations: usize,
) -> Result<Vec<ScoredRecommendation>, StageFailure> {
    let positions: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, gift)| (gift.id.as_str(), i))
        .collect();
    let profile_interests: HashMap<String, &String> = profile
        .interests
        .iter()
        .map(|interest| (interest.to_lowercase(), interest))
        .collect();

    let mut seen = HashSet::new();
    let mut scored: Vec<(usize, ScoredRecommendation)> = Vec::new();

    for item in raw {
        let Some(&position) = positions.get(item.gift_id.as_str()) else {
            tracing::warn!(gift_id = %item.gift_id, "Model recommended an unknown gift, dropping it");
            continue;
        };

        if !item.score.is_finite() || !(0.0..=100.0).contains(&item.score) {
            return Err(StageFailure::validation(
                AgentId::GiftMatch,
                format!("score {} for gift {} is outside 0..=100", item.score, item.gift_id),
            ));
        }

        if !seen.insert(position) {
            continue;
        }

        let mut matched_seen = HashSet::new();
        let matched_interests = item
            .matched_interests
            .iter()
            .filter_map(|interest| profile_interests.get(&interest.trim().to_lowercase()))
            .filter(|interest| matched_seen.insert(interest.to_lowercase()))
            .map(|interest| (*interest).clone())
            .collect();

        scored.push((
            position,
            ScoredRecommendation {
                gift: candidates[position].clone(),
                score: item.score,
                reasoning: item.reasoning.trim().to_string(),
                matched_interests,
            },
        ));
    }

    if scored.is_empty() {
        return Err(StageFailure::validation(
            AgentId::GiftMatch,
            "model returned no usable recommendations",
        ));
    }

    // catalog order first so the stable score sort breaks ties by it
    scored.sort_by_key(|(position, _)| *position);
    let mut recommendations: Vec<ScoredRecommendation> =
        scored.into_iter().map(|(_, rec)| rec).collect();
    rank_recommendations(&mut recommendations);
    recommendations.truncate(max_recommendations.max(1));

    Ok(recommendations)
}
