use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::{AgentId, ScoredRecommendation, SynthesizedProfile};

use super::StageFailure;

pub(crate) async fn narrate(
    llm: &LlmProvider,
    profile: &SynthesizedProfile,
    recommendations: &[ScoredRecommendation],
    max_chars: usize,
) -> Result<String, StageFailure> {
    let prompt = prompts::narration_prompt(profile, recommendations, max_chars);
    let options = CompletionOptions {
        temperature: Some(0.8),
        ..Default::default()
    };

    let text = llm
        .complete(&prompt, Some(prompts::WORKSHOP_SYSTEM_PROMPT), Some(&options))
        .await
        .map_err(|e| StageFailure::from_llm(AgentId::Narration, e))?;

    finalize_narration(&text, max_chars)
}

/// Trim, reject empty text and enforce the length bound. A `max_chars` of
/// zero disables the bound.
pub fn finalize_narration(text: &str, max_chars: usize) -> Result<String, StageFailure> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StageFailure::validation(
            AgentId::Narration,
            "model returned an empty narration",
        ));
    }

    if max_chars == 0 || text.chars().count() <= max_chars {
        return Ok(text.to_string());
    }

    let truncated = truncate_at_word_boundary(text, max_chars);
    tracing::debug!(
        original_chars = text.chars().count(),
        truncated_chars = truncated.chars().count(),
        "Narration exceeded the length bound, truncated"
    );
    Ok(truncated)
}

/// Longest prefix of at most `max_chars` characters that ends on a word
/// boundary. Falls back to a hard cut for a single oversized word.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let prefix = &text[..cut];

    // the next char starting a new word means the prefix already ends cleanly
    let ends_on_boundary = text[cut..].chars().next().map_or(true, char::is_whitespace);
    if ends_on_boundary {
        return prefix.trim_end().to_string();
    }

    match prefix.rfind(char::is_whitespace) {
        Some(idx) if !prefix[..idx].trim_end().is_empty() => prefix[..idx].trim_end().to_string(),
        _ => prefix.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::mock_llm;
    use crate::agents::StageFailureKind;
    use crate::models::{AgeGroup, BudgetTier};
    use wiremock::MockServer;

    #[test]
    fn test_truncate_keeps_whole_words() {
        assert_eq!(truncate_at_word_boundary("Ho ho ho merry", 8), "Ho ho ho");
        assert_eq!(truncate_at_word_boundary("Ho ho ho merry", 7), "Ho ho");
        assert_eq!(truncate_at_word_boundary("Ho ho ho merry", 5), "Ho ho");
        assert_eq!(truncate_at_word_boundary("Supercalifragilistic", 5), "Super");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "Joyeux Noël à tous";
        let truncated = truncate_at_word_boundary(text, 11);
        assert_eq!(truncated, "Joyeux Noël");
    }

    #[test]
    fn test_finalize_enforces_bound() {
        let long = "word ".repeat(1000);
        let narration = finalize_narration(&long, 2000).unwrap();
        assert!(narration.chars().count() <= 2000);
        assert!(narration.ends_with("word"));
    }

    #[test]
    fn test_finalize_rejects_blank_text() {
        let err = finalize_narration("  \n ", 2000).unwrap_err();
        assert_eq!(err.kind, StageFailureKind::Validation);
        assert_eq!(err.agent, AgentId::Narration);
    }

    #[tokio::test]
    async fn test_narrate_with_mocked_model() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server, "  Mia will adore her dinosaur dig kit!  ").await;
        let profile = SynthesizedProfile {
            session_id: "s1".to_string(),
            name: "Mia".to_string(),
            age: 4,
            age_group: AgeGroup::Preschool,
            budget: BudgetTier::Low,
            interests: vec!["dinosaurs".to_string()],
            summary: "Curious".to_string(),
            gift_themes: vec!["digging".to_string()],
            notes: None,
        };

        let text = narrate(&llm, &profile, &[], 2000).await.unwrap();
        assert_eq!(text, "Mia will adore her dinosaur dig kit!");
    }
}
