use axum::{http::StatusCode, response::IntoResponse};
use serial_test::serial;
use std::env;

use workshop::config::{parse_llm_provider_model, Config, LlmConfig, KNOWN_LLM_PROVIDERS};
use workshop::error::WorkshopError;

const LLM_VARS: &[&str] = &[
    "LLM_MODEL",
    "LLM_VISION_MODEL",
    "LLM_API_KEY",
    "LLM_BASE_URL",
    "LLM_TIMEOUT",
    "LLM_MAX_RETRIES",
];

fn clear_llm_env() {
    for var in LLM_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_llm_config_openai() {
    let (provider, model) = parse_llm_provider_model("openai/gpt-4o");
    assert_eq!(provider, "openai");
    assert_eq!(model, "gpt-4o");
}

#[test]
fn test_llm_config_openrouter_keeps_nested_model() {
    let (provider, model) = parse_llm_provider_model("openrouter/openai/gpt-4o-mini");
    assert_eq!(provider, "openrouter");
    assert_eq!(model, "openai/gpt-4o-mini");
}

#[test]
fn test_llm_config_unknown_prefix_defaults_to_local() {
    let (provider, model) = parse_llm_provider_model("unknown/model-name");
    assert_eq!(provider, "local");
    assert_eq!(model, "unknown/model-name");
}

#[test]
fn test_known_llm_providers_constant() {
    assert!(KNOWN_LLM_PROVIDERS.contains(&"openai"));
    assert!(KNOWN_LLM_PROVIDERS.contains(&"openrouter"));
    assert!(KNOWN_LLM_PROVIDERS.contains(&"ollama"));
    assert!(KNOWN_LLM_PROVIDERS.contains(&"lmstudio"));
    assert_eq!(KNOWN_LLM_PROVIDERS.len(), 4);
}

#[test]
#[serial]
fn test_llm_config_none_when_no_env() {
    clear_llm_env();

    let config = Config::default();

    assert!(
        config.llm.is_none(),
        "LlmConfig should be None when LLM_MODEL is not set"
    );
}

#[test]
#[serial]
fn test_llm_config_with_all_env_vars() {
    clear_llm_env();
    env::set_var("LLM_MODEL", "openrouter/openai/gpt-4o-mini");
    env::set_var("LLM_VISION_MODEL", "openrouter/openai/gpt-4o");
    env::set_var("LLM_API_KEY", "sk-test-key");
    env::set_var("LLM_BASE_URL", "https://api.custom.com/v1");
    env::set_var("LLM_TIMEOUT", "60");
    env::set_var("LLM_MAX_RETRIES", "5");

    let config = Config::default();
    clear_llm_env();

    let llm = config.llm.expect("LlmConfig should exist");
    assert_eq!(llm.model, "openrouter/openai/gpt-4o-mini");
    assert_eq!(llm.vision_model.as_deref(), Some("openrouter/openai/gpt-4o"));
    assert_eq!(llm.api_key.as_deref(), Some("sk-test-key"));
    assert_eq!(llm.base_url.as_deref(), Some("https://api.custom.com/v1"));
    assert_eq!(llm.timeout_secs, 60);
    assert_eq!(llm.max_retries, 5);
}

#[test]
#[serial]
fn test_invalid_numeric_env_falls_back_to_default() {
    clear_llm_env();
    env::set_var("LLM_MODEL", "openai/gpt-4o-mini");
    env::set_var("LLM_TIMEOUT", "soon");

    let config = Config::default();
    clear_llm_env();

    let llm = config.llm.expect("LlmConfig should exist");
    assert_eq!(llm.timeout_secs, 30);
    assert_eq!(llm.max_retries, 3);
    assert!(llm.vision_model.is_none());
}

#[test]
fn test_llm_error_hides_provider_detail() {
    let response = WorkshopError::Llm("upstream said no".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_llm_unavailable_maps_to_not_implemented() {
    let response = WorkshopError::LlmUnavailable("no model".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[test]
fn test_llm_config_clone() {
    let config = LlmConfig {
        model: "openai/gpt-4o".to_string(),
        vision_model: None,
        api_key: Some("secret".to_string()),
        base_url: Some("https://api.openai.com".to_string()),
        timeout_secs: 30,
        max_retries: 3,
    };

    let cloned = config.clone();

    assert_eq!(cloned.model, config.model);
    assert_eq!(cloned.api_key, config.api_key);
    assert_eq!(cloned.base_url, config.base_url);
    assert_eq!(cloned.timeout_secs, config.timeout_secs);
    assert_eq!(cloned.max_retries, config.max_retries);
}
