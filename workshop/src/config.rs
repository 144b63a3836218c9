use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: Option<LlmConfig>,
    pub pipeline: PipelineConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl DatabaseConfig {
    /// Local file database with default pragmas.
    pub fn local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    /// Model used for the photo analysis stage. Falls back to `model`.
    pub vision_model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Tuning for the agent pipeline and its event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of the bounded channel between orchestrator and transport.
    pub event_channel_capacity: usize,
    /// Upper bound for a single stage, on top of the LLM request timeout.
    pub stage_timeout_secs: u64,
    /// Keep running when the SSE client goes away instead of aborting.
    pub continue_on_disconnect: bool,
    /// Image hints below this confidence are ignored by profile synthesis.
    pub image_confidence_threshold: f32,
    pub max_recommendations: usize,
    pub narration_max_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 16,
            stage_timeout_secs: 120,
            continue_on_disconnect: false,
            image_confidence_threshold: 0.5,
            max_recommendations: 5,
            narration_max_chars: 2000,
        }
    }
}

/// Sweep of abandoned (never completed) sessions
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    pub enabled: bool,
    pub max_age_days: u32,
    pub check_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_days: 7,
            check_interval_secs: 3600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let pipeline_defaults = PipelineConfig::default();
        let retention_defaults = RetentionConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("WORKSHOP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("WORKSHOP_PORT", 3000),
                api_keys: env::var("WORKSHOP_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:workshop.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: env::var("DATABASE_JOURNAL_MODE").unwrap_or_else(|_| "WAL".to_string()),
                synchronous: env::var("DATABASE_SYNCHRONOUS")
                    .unwrap_or_else(|_| "NORMAL".to_string()),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                vision_model: env::var("LLM_VISION_MODEL").ok(),
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            }),
            pipeline: PipelineConfig {
                event_channel_capacity: parse_env_or(
                    "EVENT_CHANNEL_CAPACITY",
                    pipeline_defaults.event_channel_capacity,
                )
                .max(1),
                stage_timeout_secs: parse_env_or(
                    "PIPELINE_STAGE_TIMEOUT_SECS",
                    pipeline_defaults.stage_timeout_secs,
                ),
                continue_on_disconnect: parse_env_or(
                    "PIPELINE_CONTINUE_ON_DISCONNECT",
                    pipeline_defaults.continue_on_disconnect,
                ),
                image_confidence_threshold: parse_env_or(
                    "IMAGE_CONFIDENCE_THRESHOLD",
                    pipeline_defaults.image_confidence_threshold,
                ),
                max_recommendations: parse_env_or(
                    "MAX_RECOMMENDATIONS",
                    pipeline_defaults.max_recommendations,
                )
                .max(1),
                narration_max_chars: parse_env_or(
                    "NARRATION_MAX_CHARS",
                    pipeline_defaults.narration_max_chars,
                ),
            },
            retention: RetentionConfig {
                enabled: parse_env_or("RETENTION_ENABLED", retention_defaults.enabled),
                max_age_days: parse_env_or("RETENTION_MAX_AGE_DAYS", retention_defaults.max_age_days),
                check_interval_secs: parse_env_or(
                    "RETENTION_CHECK_INTERVAL",
                    retention_defaults.check_interval_secs,
                ),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_pipeline_config_defaults() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("EVENT_CHANNEL_CAPACITY");
        std::env::remove_var("NARRATION_MAX_CHARS");
        std::env::remove_var("PIPELINE_CONTINUE_ON_DISCONNECT");

        let config = Config::default();
        assert_eq!(config.pipeline.event_channel_capacity, 16);
        assert_eq!(config.pipeline.narration_max_chars, 2000);
        assert!(!config.pipeline.continue_on_disconnect);
        assert_eq!(config.pipeline.max_recommendations, 5);
    }

    #[test]
    fn test_event_channel_capacity_never_zero() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("EVENT_CHANNEL_CAPACITY", "0");
        let config = Config::default();
        assert_eq!(config.pipeline.event_channel_capacity, 1);
        std::env::remove_var("EVENT_CHANNEL_CAPACITY");
    }

    #[test]
    fn test_retention_defaults_to_seven_days() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("RETENTION_MAX_AGE_DAYS");
        std::env::remove_var("RETENTION_ENABLED");
        let config = Config::default();
        assert!(config.retention.enabled);
        assert_eq!(config.retention.max_age_days, 7);
    }

    #[test]
    fn test_llm_config_defaults() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("LLM_MODEL");
        std::env::remove_var("LLM_VISION_MODEL");

        let config = Config::default();
        assert!(config.llm.is_none());

        std::env::set_var("LLM_MODEL", "openai/gpt-4o-mini");
        let config = Config::default();
        let llm = config.llm.expect("llm config should be present");
        assert_eq!(llm.model, "openai/gpt-4o-mini");
        assert!(llm.vision_model.is_none());
        assert_eq!(llm.timeout_secs, 30);
        assert_eq!(llm.max_retries, 3);

        std::env::remove_var("LLM_MODEL");
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("WORKSHOP_PORT", "not-a-port");
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        std::env::remove_var("WORKSHOP_PORT");
    }

    #[test]
    fn test_api_keys_skip_blank_entries() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("WORKSHOP_API_KEYS", "alpha, ,beta");
        let config = Config::default();
        assert_eq!(config.server.api_keys, vec!["alpha", "beta"]);
        std::env::remove_var("WORKSHOP_API_KEYS");
    }

    #[test]
    fn test_parse_llm_provider_model() {
        assert_eq!(
            parse_llm_provider_model("openai/gpt-4o-mini"),
            ("openai", "gpt-4o-mini")
        );
        assert_eq!(parse_llm_provider_model("llama3"), ("local", "llama3"));
        assert_eq!(
            parse_llm_provider_model("custom/model"),
            ("local", "custom/model")
        );
    }
}
