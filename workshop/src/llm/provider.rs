use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{Result, WorkshopError};
use crate::llm::api::LlmApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::OpenRouter => write!(f, "openrouter"),
            Self::Ollama => write!(f, "ollama"),
            Self::LmStudio => write!(f, "lmstudio"),
            Self::OpenAICompatible { .. } => write!(f, "openai-compatible"),
            Self::Unavailable { .. } => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        Self {
            backend,
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let client = self.client()?;
        client.complete(prompt, system_prompt, options).await
    }

    pub async fn complete_json(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<Value> {
        let client = self.client()?;
        client.complete_json(prompt, system_prompt, options).await
    }

    pub async fn complete_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<T> {
        let json_value = self.complete_json(prompt, system_prompt, None).await?;

        serde_json::from_value(json_value)
            .map_err(|e| WorkshopError::LlmResponse(format!("Failed to deserialize response: {e}")))
    }

    /// Structured completion over an image. Uses `vision_model` when
    /// configured, otherwise the main model.
    pub async fn complete_vision_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        image_url: &str,
    ) -> Result<T> {
        let config = self.available_config()?;
        let client = match &config.vision_model {
            Some(vision_model) => LlmApiClient::new(&LlmConfig {
                model: vision_model.clone(),
                ..config.clone()
            })?,
            None => LlmApiClient::new(config)?,
        };

        let json_value = client.complete_vision_json(prompt, image_url, None).await?;

        serde_json::from_value(json_value)
            .map_err(|e| WorkshopError::LlmResponse(format!("Failed to deserialize response: {e}")))
    }

    fn client(&self) -> Result<LlmApiClient> {
        LlmApiClient::new(self.available_config()?)
    }

    fn available_config(&self) -> Result<&LlmConfig> {
        if !self.is_available() {
            return Err(WorkshopError::LlmUnavailable(self.unavailable_reason()));
        }

        self.config()
            .ok_or_else(|| WorkshopError::LlmUnavailable("No config available".to_string()))
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM completion is not available".to_string(),
        }
    }
}
