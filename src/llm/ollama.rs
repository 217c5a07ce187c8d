use super::*;
use crate::types::{ChatRole, ChatTurn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama provider implementation, talking to the local chat API
pub struct OllamaProvider {
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given base URL and model
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            base_url,
            model,
            timeout,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    #[allow(dead_code)] // Part of Ollama API response format
    done: bool,
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[async_trait]
impl ReasoningProvider for OllamaProvider {
    async fn complete(
        &self,
        prompt: &str,
        session_key: &str,
        context: &[ChatTurn],
    ) -> LlmResult<String> {
        let start = Instant::now();

        let mut messages: Vec<OllamaMessage> = context
            .iter()
            .map(|turn| OllamaMessage {
                role: role_str(turn.role).to_string(),
                content: turn.content.clone(),
            })
            .collect();

        if !prompt.is_empty() {
            messages.push(OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            });
        }

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);

        let response = tokio::time::timeout(
            self.timeout,
            self.client.post(&url).json(&request).send(),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.timeout))?
        .map_err(|e| LlmError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::ApiError(format!(
                "Ollama API returned status: {}",
                response.status()
            )));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        tracing::debug!(
            "Ollama reply for session {} in {}ms",
            session_key,
            start.elapsed().as_millis()
        );

        Ok(chat_response.message.content.trim().to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
