//! # agent-core
//!
//! Tool-augmented conversational agent with a pluggable reasoning strategy.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  AgentLoop (console)                                          │
//! │     │ send(line)                                              │
//! │     ▼                                                         │
//! │  ConversationSession ──────────▶ LlmProvider (Strategy)       │
//! │     │ tool calls                                              │
//! │     ▼                                                         │
//! │  ToolInvoker ──resolve──▶ ToolRegistry                        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the session independent of the backend;
//! the `ReasoningMode` picks between plain chat, function calling and
//! ReAct-style narration.

pub mod builtin;
pub mod calc;
pub mod console;
pub mod error;
pub mod invoker;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

#[cfg(test)]
mod testing;

pub use console::AgentLoop;
pub use error::{AgentError, BackendError, Result};
pub use invoker::ToolInvoker;
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use reasoning::{ReactTrace, ReasoningMode};
pub use session::{ConversationSession, SessionBuilder, SessionConfig, TurnState};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
