use serde::Deserialize;
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use workshop::config::LlmConfig;
use workshop::error::WorkshopError;
use workshop::llm::{LlmApiClient, LlmBackend, LlmProvider};

fn llm_config(model: &str) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        vision_model: None,
        api_key: Some("test-key".to_string()),
        base_url: None,
        timeout_secs: 30,
        max_retries: 3,
    }
}

fn llm_config_with_base_url(model: &str, base_url: String, max_retries: u32) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        vision_model: None,
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries,
    }
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

#[test]
fn test_openai_provider_detection() {
    let provider = LlmProvider::new(Some(&llm_config("openai/gpt-4o")));
    assert!(matches!(provider.backend(), LlmBackend::OpenAI));
}

#[test]
fn test_openrouter_provider_detection() {
    let provider = LlmProvider::new(Some(&llm_config("openrouter/openai/gpt-4o")));
    assert!(matches!(provider.backend(), LlmBackend::OpenRouter));
}

#[test]
fn test_custom_model_with_base_url_is_openai_compatible() {
    let mut config = llm_config("my-finetune");
    config.base_url = Some("http://models.internal:8000/v1".to_string());
    let provider = LlmProvider::new(Some(&config));

    match provider.backend() {
        LlmBackend::OpenAICompatible { base_url } => {
            assert_eq!(base_url, "http://models.internal:8000/v1")
        }
        other => panic!("Expected OpenAI-compatible backend, got: {other:?}"),
    }
    assert_eq!(provider.backend().to_string(), "openai-compatible");
}

#[test]
fn test_unavailable_provider() {
    let provider = LlmProvider::new(None);

    assert!(matches!(provider.backend(), LlmBackend::Unavailable { .. }));
    assert!(!provider.is_available());
}

#[test]
fn test_api_client_requires_key_for_hosted_providers() {
    let mut config = llm_config("openai/gpt-4o-mini");
    config.api_key = None;

    assert!(matches!(LlmApiClient::new(&config), Err(WorkshopError::Llm(_))));
}

#[test]
fn test_api_client_allows_keyless_local_models() {
    let mut config = llm_config("ollama/llama3.2");
    config.api_key = None;

    if let Err(error) = LlmApiClient::new(&config) {
        panic!("Expected keyless Ollama client, got: {error}");
    }
}

#[tokio::test]
async fn test_complete_returns_response_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello from mock")))
        .expect(1)
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.complete("Hello", None, None).await;

    match result {
        Ok(value) => assert_eq!(value, "Hello from mock"),
        Err(error) => panic!("Expected completion to succeed, got: {error}"),
    }
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_mock = Arc::clone(&attempts);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |_request: &Request| {
            if attempts_for_mock.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(500).set_body_string("upstream temporary failure")
            } else {
                ResponseTemplate::new(200).set_body_json(completion_body("Recovered response"))
            }
        })
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 2);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.complete("Retry test", None, None).await;

    match result {
        Ok(value) => assert_eq!(value, "Recovered response"),
        Err(error) => panic!("Expected retry completion to succeed, got: {error}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rate_limit_handling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(api_error_body(
                    "Rate limit exceeded",
                    "insufficient_quota",
                    "insufficient_quota",
                )),
        )
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.complete("Rate limit test", None, None).await;

    assert!(matches!(
        result,
        Err(WorkshopError::LlmRateLimit { retry_after: None })
    ));
}

#[tokio::test]
async fn test_auth_error_returns_llm_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(api_error_body(
            "Invalid API key",
            "invalid_request_error",
            "invalid_api_key",
        )))
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.complete("Auth test", None, None).await;

    match result {
        Err(WorkshopError::Llm(message)) => {
            assert!(message.to_lowercase().contains("authentication failed"));
        }
        other => panic!("Expected Llm auth error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_prompt_validation() {
    let provider = LlmProvider::new(Some(&llm_config("openai/gpt-4o-mini")));

    let result = provider.complete("   ", None, None).await;

    match result {
        Err(WorkshopError::Validation(message)) => {
            assert!(message.contains("Prompt cannot be empty"));
        }
        other => panic!("Expected Validation error, got: {other:?}"),
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct PhotoCues {
    visible_interests: Vec<String>,
    confidence: f32,
}

#[tokio::test]
async fn test_complete_json_strips_code_fences() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "```json\n{\"visibleInterests\": [\"kites\"], \"confidence\": 0.75}\n```",
        )))
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    let provider = LlmProvider::new(Some(&config));

    let result: Result<PhotoCues, WorkshopError> =
        provider.complete_structured("Describe the photo", None).await;

    match result {
        Ok(cues) => assert_eq!(
            cues,
            PhotoCues {
                visible_interests: vec!["kites".to_string()],
                confidence: 0.75,
            }
        ),
        Err(error) => panic!("Expected fenced JSON to parse, got: {error}"),
    }
}

#[tokio::test]
async fn test_vision_request_uses_vision_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"model\":\"gpt-4o\""))
        .and(body_string_contains("https://photos.example.com/kid.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "{\"visibleInterests\": [], \"confidence\": 0.2}",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut config =
        llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    config.vision_model = Some("openai/gpt-4o".to_string());
    let provider = LlmProvider::new(Some(&config));

    let result: Result<PhotoCues, WorkshopError> = provider
        .complete_vision_structured("Describe the photo", "https://photos.example.com/kid.jpg")
        .await;

    match result {
        Ok(cues) => assert!(cues.visible_interests.is_empty()),
        Err(error) => panic!("Expected vision completion to succeed, got: {error}"),
    }
}

#[tokio::test]
async fn test_complete_structured_unavailable_provider() {
    let provider = LlmProvider::new(None);
    let result: Result<PhotoCues, WorkshopError> =
        provider.complete_structured("test prompt", None).await;
    assert!(matches!(result, Err(WorkshopError::LlmUnavailable(_))));
}

#[tokio::test]
async fn test_complete_json_no_api_key() {
    let mut config = llm_config("openai/gpt-4o");
    config.api_key = None;
    let provider = LlmProvider::new(Some(&config));
    let result = provider.complete_json("test prompt", None, None).await;
    assert!(matches!(result, Err(WorkshopError::Llm(_))));
}
