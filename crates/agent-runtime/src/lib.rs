//! # agent-runtime
//!
//! Model backends for the agent.
//!
//! ## Providers
//!
//! - **Ollama** (default): Local LLM inference via Ollama, tools offered
//!   through the fenced-block text protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OllamaProvider;
//!
//! let provider = OllamaProvider::from_env();
//! let session = ConversationSession::builder()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, AgentLoop, ConversationSession, LlmProvider, Message, ReasoningMode, Result, Role,
    Tool, ToolRegistry,
};
