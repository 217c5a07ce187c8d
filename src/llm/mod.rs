mod ollama;
mod openai;

use crate::types::ChatTurn;
use async_trait::async_trait;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Result type for reasoning-service operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to the reasoning service
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// External reasoning service the judge and answer checker call into.
///
/// Implementations return raw free text; the caller is responsible for
/// normalizing it into the closed answer vocabulary.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Complete a prompt. `context` carries the session's role-tagged
    /// conversation turns; a non-empty `prompt` is sent as an additional
    /// user turn after the context.
    async fn complete(
        &self,
        prompt: &str,
        session_key: &str,
        context: &[ChatTurn],
    ) -> LlmResult<String>;

    /// Name of this provider, for logging
    fn name(&self) -> &str;
}

/// Configuration for reasoning-service providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Ollama base URL
    pub ollama_base_url: Option<String>,
    /// Ollama model to use
    pub ollama_model: String,
    /// Timeout for service calls
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: None,
            ollama_model: "llama3.2".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().and_then(|key| {
            let trimmed = key.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let openai_model = std::env::var("OPENAI_MODEL")
            .ok()
            .and_then(|model| {
                let trimmed = model.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        let ollama_base_url = std::env::var("OLLAMA_BASE_URL").ok().and_then(|url| {
            let trimmed = url.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let ollama_model = std::env::var("OLLAMA_MODEL")
            .ok()
            .and_then(|model| {
                let trimmed = model.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "llama3.2".to_string());

        Self {
            openai_api_key,
            openai_model,
            ollama_base_url,
            ollama_model,
            timeout: std::env::var("LLM_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(30)),
        }
    }

    /// Build the configured provider. OpenAI wins when both are configured.
    pub fn build_provider(&self) -> LlmResult<Box<dyn ReasoningProvider>> {
        if let Some(api_key) = &self.openai_api_key {
            return Ok(Box::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
                self.timeout,
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            return Ok(Box::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
                self.timeout,
            )));
        }

        Err(LlmError::ConfigError(
            "No reasoning provider configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.ollama_model, "llama3.2");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_build_provider_requires_configuration() {
        let config = LlmConfig::default();
        assert!(matches!(
            config.build_provider(),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn test_build_provider_prefers_openai() {
        let config = LlmConfig {
            openai_api_key: Some("sk-test".to_string()),
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ..LlmConfig::default()
        };
        let provider = config.build_provider().expect("provider configured");
        assert_eq!(provider.name(), "openai");
    }
}
