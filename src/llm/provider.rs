use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{AppResult, LLMMessage, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Facade over the configured completion adapter. The pipeline treats this as
/// a fallible text-completion oracle; every call site carries its own fallback.
pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    model: String,
    temperature: f32,
}

impl LLM {
    pub fn from_config(config: &LLMConfig) -> Self {
        let adapter = crate::llm::openai::OpenAIAdapter::new(&config.api_key)
            .with_base_url(&config.base_url)
            .with_timeout(config.timeout_secs);

        Self {
            adapter: Box::new(adapter),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Build a facade around an arbitrary adapter. Tests use this to substitute
    /// scripted doubles for the remote API.
    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            model: model.into(),
            temperature: 0.3,
        }
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }

    /// Single-prompt completion with the configured model and temperature.
    pub async fn complete(&self, prompt: &str) -> AppResult<String> {
        self.complete_with_messages(vec![LLMMessage::user(prompt)]).await
    }

    /// Multi-message completion; used where conversation history matters.
    pub async fn complete_with_messages(&self, messages: Vec<LLMMessage>) -> AppResult<String> {
        let request = LLMRequest {
            model: self.model.clone(),
            messages,
            max_tokens: None,
            temperature: Some(self.temperature),
        };

        let response = self.adapter.create_chat_completion(&request).await?;
        Ok(response.content)
    }
}
