//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference. Tools are
//! offered through the text protocol: their declarations are appended to
//! the system prompt and ```` ```tool ```` blocks in the reply are parsed back
//! into tool calls.

use agent_core::{
    error::{BackendError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
    tool::{parse_tool_calls, prompt_section, ToolSchema},
};
use async_trait::async_trait;
use ollama_rs::{
    generation::{
        chat::{request::ChatMessageRequest, ChatMessage, ChatMessageResponse, MessageRole},
    },
    models::ModelOptions as OllamaOptions,
    Ollama,
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
        })
    }

    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(&config.host, config.port),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Convert agent messages to Ollama format, declaring `tools` in the
    /// system prompt
    fn convert_messages(messages: &[Message], tools: &[ToolSchema]) -> Vec<ChatMessage> {
        let mut converted: Vec<ChatMessage> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                    Role::Tool => MessageRole::User, // Observations appear as user context
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect();

        if !tools.is_empty() {
            let section = prompt_section(tools);
            match messages.first() {
                Some(first) if first.role == Role::System => {
                    converted[0] = ChatMessage::new(
                        MessageRole::System,
                        format!("{}\n\n{}", first.content, section),
                    );
                }
                _ => converted.insert(0, ChatMessage::new(MessageRole::System, section)),
            }
        }

        converted
    }

    /// Convert Ollama response to agent completion
    fn convert_completion(response: ChatMessageResponse, model: &str, tools_offered: bool) -> Completion {
        let content = response.message.content;
        let tool_calls = if tools_offered {
            parse_tool_calls(&content)
        } else {
            Vec::new()
        };
        let finish_reason = if tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolUse
        };

        Completion {
            content,
            tool_calls,
            model: model.to_string(),
            usage: response
                .final_data
                .as_ref()
                .map(|d| token_usage(d.prompt_eval_count, d.eval_count)),
            finish_reason: Some(finish_reason),
        }
    }

    /// Build Ollama generation options
    fn build_options(opts: &GenerationOptions) -> OllamaOptions {
        OllamaOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(opts.max_tokens as i32)
    }
}

/// Token counts clamped to `u32`
fn token_usage(prompt: impl Into<u64>, completion: impl Into<u64>) -> TokenUsage {
    let prompt_tokens = u32::try_from(prompt.into()).unwrap_or(u32::MAX);
    let completion_tokens = u32::try_from(completion.into()).unwrap_or(u32::MAX);

    TokenUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            version: None, // Ollama API doesn't expose version
            models,
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let ollama_messages = Self::convert_messages(messages, tools);
        let ollama_options = Self::build_options(options);

        let request = ChatMessageRequest::new(options.model.clone(), ollama_messages)
            .options(ollama_options);

        tracing::debug!(model = %options.model, messages = messages.len(), tools = tools.len(), "Ollama chat request");

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| BackendError::classify(e.to_string()))?;

        Ok(Self::convert_completion(response, &options.model, !tools.is_empty()))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                context_length: None, // Not exposed by Ollama API
            })
            .collect())
    }
}
