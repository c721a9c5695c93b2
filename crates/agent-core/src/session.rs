//! Session Management
//!
//! A [`ConversationSession`] owns the message history and is the only thing
//! that talks to the model backend. One call to [`ConversationSession::send`]
//! is one turn:
//!
//! ```text
//! Idle ──▶ AwaitingBackendReply ──▶ Idle
//!               │        ▲
//!               ▼        │
//!           ToolCallsPending
//!
//! any state ──(backend error / iteration bound)──▶ ErrorReported
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, BackendError, Result};
use crate::invoker::{ToolInvoker, DEFAULT_TOOL_TIMEOUT};
use crate::message::{Conversation, Message};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::reasoning::ReasoningMode;
use crate::tool::{Tool, ToolRegistry, ToolSchema};

/// Default bound on backend round trips per turn
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Default deadline for one backend reply
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a session is within a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// Between turns
    Idle,
    /// History sent, waiting for the backend
    AwaitingBackendReply,
    /// Backend asked for this many tool calls
    ToolCallsPending(usize),
    /// The last turn failed; the session is still usable
    ErrorReported,
}

impl TurnState {
    /// Whether the turn state machine allows `self -> next`
    pub fn can_transition_to(self, next: TurnState) -> bool {
        use TurnState::*;
        match (self, next) {
            (Idle | ErrorReported, AwaitingBackendReply) => true,
            (AwaitingBackendReply, Idle | ToolCallsPending(_)) => true,
            (ToolCallsPending(_), AwaitingBackendReply) => true,
            (AwaitingBackendReply | ToolCallsPending(_), ErrorReported) => true,
            _ => false,
        }
    }

    /// Whether a new turn may start
    pub fn is_ready(self) -> bool {
        matches!(self, TurnState::Idle | TurnState::ErrorReported)
    }
}

/// Session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Reasoning strategy
    pub mode: ReasoningMode,

    /// System prompt; the mode's prompt when unset
    pub system_prompt: Option<String>,

    /// Maximum backend round trips per turn (at least 1)
    pub max_iterations: usize,

    /// Deadline for each backend reply
    pub backend_timeout: Duration,

    /// Deadline for each tool call
    pub tool_timeout: Duration,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ReasoningMode::default(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            generation: GenerationOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Effective system prompt
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or_else(|| self.mode.system_prompt())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }
        if self.backend_timeout.is_zero() || self.tool_timeout.is_zero() {
            return Err(AgentError::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }
}

/// A conversation with the model backend
pub struct ConversationSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    conversation: Conversation,
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    invoker: ToolInvoker,
    config: SessionConfig,
    state: TurnState,
}

impl ConversationSession {
    /// Create a new session
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;

        let session = Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            conversation: Conversation::with_system_prompt(config.system_prompt()),
            provider,
            invoker: ToolInvoker::new(config.tool_timeout),
            tools,
            config,
            state: TurnState::Idle,
        };

        tracing::info!(
            session = %session.id,
            mode = %session.config.mode,
            tools = session.tools.len(),
            "Session created"
        );

        Ok(session)
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Full history, system prompt first
    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn: send `user_text`, resolve any tool calls, return the reply.
    ///
    /// On error the messages already appended during the turn stay in the
    /// history and the session accepts the next turn.
    pub async fn send(&mut self, user_text: &str) -> Result<String> {
        if !self.state.is_ready() {
            // A previous `send` future was dropped mid-turn.
            tracing::warn!(session = %self.id, state = ?self.state, "Previous turn was abandoned");
            self.state = TurnState::ErrorReported;
        }

        self.conversation.push(Message::user(user_text));

        match self.run_turn().await {
            Ok(reply) => {
                self.transition(TurnState::Idle);
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Turn failed");
                self.transition(TurnState::ErrorReported);
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self) -> Result<String> {
        let declarations: Vec<ToolSchema> = if self.config.mode.offers_tools() {
            self.tools.schemas()
        } else {
            Vec::new()
        };

        for iteration in 1..=self.config.max_iterations {
            self.transition(TurnState::AwaitingBackendReply);
            tracing::debug!(session = %self.id, iteration, "Requesting completion");

            let completion = self.request_completion(&declarations).await?;

            if !completion.wants_tools() {
                self.conversation
                    .push(Message::assistant(&completion.content).with_model(&completion.model));
                return Ok(completion.content);
            }

            let calls = completion.tool_calls;
            self.transition(TurnState::ToolCallsPending(calls.len()));
            self.conversation.push(
                Message::assistant_tool_calls(completion.content, calls.clone())
                    .with_model(completion.model),
            );

            for call in &calls {
                let result = self.invoker.dispatch(&self.tools, call).await;
                self.conversation.push(Message::observation(&result));
            }
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    async fn request_completion(&self, declarations: &[ToolSchema]) -> Result<Completion> {
        let request = self.provider.complete(
            self.conversation.messages(),
            declarations,
            &self.config.generation,
        );

        match tokio::time::timeout(self.config.backend_timeout, request).await {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(AgentError::Backend(e))) => Err(AgentError::Backend(e)),
            Ok(Err(other)) => Err(BackendError::Provider(other.to_string()).into()),
            Err(_) => Err(BackendError::Timeout(self.config.backend_timeout).into()),
        }
    }

    fn transition(&mut self, next: TurnState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid turn transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}

/// Builder for a [`ConversationSession`]
pub struct SessionBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    shared_tools: Option<Arc<ToolRegistry>>,
    config: SessionConfig,
    pending_error: Option<AgentError>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            shared_tools: None,
            config: SessionConfig::default(),
            pending_error: None,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add one tool; duplicate names fail at [`build`](Self::build)
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.shared_tools = None;
        if let Err(e) = self.tools.register(tool) {
            self.pending_error.get_or_insert(e);
        }
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self.shared_tools = None;
        self
    }

    pub fn shared_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.shared_tools = Some(tools);
        self
    }

    pub fn mode(mut self, mode: ReasoningMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn backend_timeout(mut self, timeout: Duration) -> Self {
        self.config.backend_timeout = timeout;
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.config.tool_timeout = timeout;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ConversationSession> {
        if let Some(e) = self.pending_error {
            return Err(e);
        }
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tools = self.shared_tools.unwrap_or_else(|| Arc::new(self.tools));

        ConversationSession::new(provider, tools, self.config)
    }
}
