//! Prompt templates for the workshop stages
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Every JSON prompt spells out the exact response shape the stage parses.

use crate::models::{Gift, ImageAnalysisResult, KidProfile, ScoredRecommendation, SynthesizedProfile};

/// System persona shared by every workshop prompt.
pub const WORKSHOP_SYSTEM_PROMPT: &str = "You are a cheerful workshop elf helping grown-ups \
pick thoughtful, age-appropriate gifts for children. You never guess sensitive attributes \
such as ethnicity, health or religion.";

/// Generate the instruction sent alongside a child's photo.
///
/// The model is asked for observable cues only; the image itself travels as
/// a separate content part.
pub fn image_analysis_prompt() -> String {
    r#"Look at this photo of a child and describe only what is visible.
Do not identify the child and do not infer sensitive attributes.

Return JSON with exactly these fields:
{
  "estimatedAge": <integer years between 0 and 17, or null if unsure>,
  "visibleInterests": [<short interest keywords suggested by toys, clothing or surroundings>],
  "colors": [<dominant favourite-looking colors>],
  "environment": [<setting cues such as "bedroom", "park", "beach">],
  "confidence": <number between 0.0 and 1.0 for how informative the photo is>
}

Respond with valid JSON only."#
        .to_string()
}

/// Generate a prompt that turns questionnaire answers into a short
/// personality summary and gift themes.
///
/// # Arguments
/// * `profile` - The submitted questionnaire answers
/// * `interests` - Interests after merging in trusted photo hints
/// * `analysis` - Photo cues, only passed when confident enough to use
///
/// # Example
/// ```
/// use workshop::llm::prompts::profile_synthesis_prompt;
/// use workshop::models::KidProfile;
///
/// let profile = KidProfile::new("s1".into(), "Mia".into(), 4, vec!["dinosaurs".into()]);
/// let prompt = profile_synthesis_prompt(&profile, &profile.interests, None);
/// assert!(prompt.contains("dinosaurs"));
/// ```
pub fn profile_synthesis_prompt(
    profile: &KidProfile,
    interests: &[String],
    analysis: Option<&ImageAnalysisResult>,
) -> String {
    let notes = profile.notes.as_deref().unwrap_or("none");
    let photo_cues = match analysis {
        Some(a) => format!(
            "Colors: {}\nSetting: {}",
            join_or_none(&a.colors),
            join_or_none(&a.environment)
        ),
        None => "none".to_string(),
    };

    format!(
        r#"Write a gift-giving profile for this child.

Name: {name}
Age: {age}
Budget: {budget}
Interests: {interests}
Parent notes: {notes}
Photo cues:
{photo_cues}

Return JSON with exactly these fields:
{{
  "summary": "<two warm sentences describing the child's personality and play style>",
  "giftThemes": ["<3 to 5 short gift themes, e.g. \"hands-on science\">"]
}}

Respond with valid JSON only."#,
        name = profile.name,
        age = profile.age,
        budget = profile.budget,
        interests = join_or_none(interests),
    )
}

/// Generate a prompt asking the model to score catalog candidates.
///
/// Candidate ids are the only identifiers the model may return; anything
/// else is dropped by the caller.
pub fn gift_match_prompt(profile: &SynthesizedProfile, candidates: &[Gift]) -> String {
    let catalog = candidates
        .iter()
        .map(|gift| {
            format!(
                "- id: {} | {} | {} | tags: {}",
                gift.id,
                gift.name,
                gift.description,
                gift.tags.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Match gifts to this child.

Child: {name}, age {age} ({age_group})
Summary: {summary}
Interests: {interests}
Gift themes: {themes}

Candidate gifts (already filtered for age and budget):
{catalog}

Score every candidate from 0 to 100 for how delighted this child would be.
Return JSON with exactly this shape:
{{
  "recommendations": [
    {{
      "giftId": "<id from the list above>",
      "score": <number 0-100>,
      "reasoning": "<one sentence, addressed to the parent>",
      "matchedInterests": ["<interests from the list above that this gift serves>"]
    }}
  ]
}}

Respond with valid JSON only."#,
        name = profile.name,
        age = profile.age,
        age_group = profile.age_group,
        summary = profile.summary,
        interests = join_or_none(&profile.interests),
        themes = join_or_none(&profile.gift_themes),
    )
}

/// Generate the prompt for the closing narration.
///
/// # Example
/// ```
/// use workshop::llm::prompts::narration_prompt;
/// use workshop::models::{AgeGroup, BudgetTier, SynthesizedProfile};
///
/// let profile = SynthesizedProfile {
///     session_id: "s1".into(),
///     name: "Mia".into(),
///     age: 4,
///     age_group: AgeGroup::Preschool,
///     budget: BudgetTier::Low,
///     interests: vec!["dinosaurs".into()],
///     summary: "Curious".into(),
///     gift_themes: vec!["prehistoric play".into()],
///     notes: None,
/// };
/// let prompt = narration_prompt(&profile, &[], 2000);
/// assert!(prompt.contains("2000"));
/// ```
pub fn narration_prompt(
    profile: &SynthesizedProfile,
    recommendations: &[ScoredRecommendation],
    max_chars: usize,
) -> String {
    let picks = recommendations
        .iter()
        .enumerate()
        .map(|(i, rec)| format!("{}. {} ({})", i + 1, rec.gift.name, rec.reasoning))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Write a short, festive narration presenting these gift ideas for {name}, age {age}.

About {name}: {summary}

Top picks:
{picks}

Speak warmly to the parent, mention the top picks by name, and keep it under {max_chars} characters.
Reply with the narration text only, no headings or lists."#,
        name = profile.name,
        age = profile.age,
        summary = profile.summary,
    )
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
