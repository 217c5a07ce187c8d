use super::*;
use crate::types::ChatRole;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Instant;

/// OpenAI provider implementation
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given API key and model
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model,
            timeout,
        }
    }

    fn convert_turn(turn: &ChatTurn) -> LlmResult<ChatCompletionRequestMessage> {
        let message = match turn.role {
            ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(turn.content.as_str())
                .build()
                .map_err(|e| LlmError::ApiError(e.to_string()))?
                .into(),
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.content.as_str())
                .build()
                .map_err(|e| LlmError::ApiError(e.to_string()))?
                .into(),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.content.as_str())
                .build()
                .map_err(|e| LlmError::ApiError(e.to_string()))?
                .into(),
        };
        Ok(message)
    }
}

#[async_trait]
impl ReasoningProvider for OpenAiProvider {
    async fn complete(
        &self,
        prompt: &str,
        session_key: &str,
        context: &[ChatTurn],
    ) -> LlmResult<String> {
        let start = Instant::now();

        let mut messages: Vec<ChatCompletionRequestMessage> = context
            .iter()
            .map(Self::convert_turn)
            .collect::<LlmResult<_>>()?;

        if !prompt.is_empty() {
            messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| LlmError::ApiError(e.to_string()))?
                    .into(),
            );
        }

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        let response =
            tokio::time::timeout(self.timeout, self.client.chat().create(chat_request))
                .await
                .map_err(|_| LlmError::Timeout(self.timeout))?
                .map_err(|e| LlmError::ApiError(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::ParseError("No content in response".to_string()))?;

        tracing::debug!(
            "OpenAI reply for session {} in {}ms",
            session_key,
            start.elapsed().as_millis()
        );

        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Only run with actual API key
    async fn test_openai_complete() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let provider = OpenAiProvider::new(
            api_key,
            "gpt-4o-mini".to_string(),
            Duration::from_secs(30),
        );

        let context = [
            ChatTurn::system("Answer with exactly one word."),
            ChatTurn::user("Is water wet?"),
        ];
        let reply = provider.complete("", "test-session", &context).await.unwrap();

        assert!(!reply.is_empty());
        println!("Reply: {}", reply);
    }
}
