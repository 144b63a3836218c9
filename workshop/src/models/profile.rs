use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gift budget, ordered `low < medium < high`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "mid" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown budget tier: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Toddler,
    Preschool,
    SchoolAge,
    Tween,
    Teen,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::Toddler,
        AgeGroup::Preschool,
        AgeGroup::SchoolAge,
        AgeGroup::Tween,
        AgeGroup::Teen,
    ];

    /// Bucket an age in years. Anything past 12 counts as a teen.
    pub fn from_age(age: u8) -> Self {
        match age {
            0..=2 => Self::Toddler,
            3..=5 => Self::Preschool,
            6..=8 => Self::SchoolAge,
            9..=12 => Self::Tween,
            _ => Self::Teen,
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toddler => write!(f, "toddler"),
            Self::Preschool => write!(f, "preschool"),
            Self::SchoolAge => write!(f, "school_age"),
            Self::Tween => write!(f, "tween"),
            Self::Teen => write!(f, "teen"),
        }
    }
}

impl std::str::FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toddler" => Ok(Self::Toddler),
            "preschool" => Ok(Self::Preschool),
            "school_age" | "school-age" => Ok(Self::SchoolAge),
            "tween" => Ok(Self::Tween),
            "teen" => Ok(Self::Teen),
            _ => Err(format!("Unknown age group: {s}")),
        }
    }
}

pub const MAX_AGE: u8 = 17;
pub const MAX_INTERESTS: usize = 10;

/// Questionnaire answers for one session, plus whatever profile synthesis
/// derived from them on the last successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KidProfile {
    pub session_id: String,
    pub name: String,
    pub age: u8,
    pub interests: Vec<String>,
    pub budget: BudgetTier,
    pub notes: Option<String>,
    pub insights: Option<ProfileInsights>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KidProfile {
    pub fn new(session_id: String, name: String, age: u8, interests: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            name,
            age,
            interests,
            budget: BudgetTier::default(),
            notes: None,
            insights: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Columns written back by the profile stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileInsights {
    pub age_group: AgeGroup,
    pub merged_interests: Vec<String>,
    pub summary: String,
    pub gift_themes: Vec<String>,
}

/// Output of the profile stage and input of gift matching and narration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedProfile {
    pub session_id: String,
    pub name: String,
    pub age: u8,
    pub age_group: AgeGroup,
    pub budget: BudgetTier,
    pub interests: Vec<String>,
    pub summary: String,
    pub gift_themes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SynthesizedProfile {
    pub fn insights(&self) -> ProfileInsights {
        ProfileInsights {
            age_group: self.age_group,
            merged_interests: self.interests.clone(),
            summary: self.summary.clone(),
            gift_themes: self.gift_themes.clone(),
        }
    }
}

/// Ephemeral output of the photo stage, consumed by profile synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisResult {
    pub estimated_age: Option<u8>,
    pub visible_interests: Vec<String>,
    pub colors: Vec<String>,
    pub environment: Vec<String>,
    pub confidence: f32,
}

/// Trim, drop empties and case-insensitive duplicates, keep first-seen order.
pub fn normalize_interests<I, S>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_groups_cover_boundaries() {
        assert_eq!(AgeGroup::from_age(0), AgeGroup::Toddler);
        assert_eq!(AgeGroup::from_age(2), AgeGroup::Toddler);
        assert_eq!(AgeGroup::from_age(3), AgeGroup::Preschool);
        assert_eq!(AgeGroup::from_age(4), AgeGroup::Preschool);
        assert_eq!(AgeGroup::from_age(6), AgeGroup::SchoolAge);
        assert_eq!(AgeGroup::from_age(12), AgeGroup::Tween);
        assert_eq!(AgeGroup::from_age(17), AgeGroup::Teen);
    }

    #[test]
    fn test_budget_tiers_are_ordered() {
        assert!(BudgetTier::Low < BudgetTier::Medium);
        assert!(BudgetTier::Medium < BudgetTier::High);
        assert_eq!("mid".parse::<BudgetTier>().unwrap(), BudgetTier::Medium);
    }

    #[test]
    fn test_age_group_serializes_snake_case() {
        let json = serde_json::to_value(AgeGroup::SchoolAge).unwrap();
        assert_eq!(json, "school_age");
        assert_eq!("school-age".parse::<AgeGroup>().unwrap(), AgeGroup::SchoolAge);
    }

    #[test]
    fn test_normalize_interests_dedups_case_insensitively() {
        let interests = normalize_interests(["Dinosaurs", " dinosaurs ", "", "trucks"], 10);
        assert_eq!(interests, vec!["Dinosaurs", "trucks"]);
    }

    #[test]
    fn test_normalize_interests_respects_limit() {
        let interests = normalize_interests(["a", "b", "c"], 2);
        assert_eq!(interests, vec!["a", "b"]);
    }

    #[test]
    fn test_synthesized_profile_uses_camel_case() {
        let profile = SynthesizedProfile {
            session_id: "s1".to_string(),
            name: "Mia".to_string(),
            age: 4,
            age_group: AgeGroup::Preschool,
            budget: BudgetTier::Low,
            interests: vec!["dinosaurs".to_string()],
            summary: "Curious".to_string(),
            gift_themes: vec!["prehistoric play".to_string()],
            notes: None,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["ageGroup"], "preschool");
        assert_eq!(json["giftThemes"][0], "prehistoric play");
        assert!(json.get("notes").is_none());
    }
}
