//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Failures reported by (or while talking to) the model backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend unreachable or not responding
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Credential rejected by the backend
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Too many requests
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other provider-side failure
    #[error("provider error: {0}")]
    Provider(String),

    /// No reply within the configured deadline
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Classify a raw provider error message.
    ///
    /// Providers that only surface strings (HTTP clients, SDK wrappers) use this
    /// to keep auth and rate-limit failures distinguishable.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("401") || lower.contains("403") || lower.contains("unauthorized")
            || lower.contains("api key") || lower.contains("forbidden")
        {
            BackendError::Auth(message)
        } else if lower.contains("429") || lower.contains("rate limit") {
            BackendError::RateLimited(message)
        } else if lower.contains("connection refused")
            || lower.contains("error sending request")
            || lower.contains("dns error")
        {
            BackendError::Unavailable(message)
        } else {
            BackendError::Provider(message)
        }
    }
}

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model backend failure (network, auth, provider, timeout)
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Tool did not finish in time
    #[error("Tool '{tool}' timed out after {timeout:?}")]
    ToolTimeout { tool: String, timeout: Duration },

    /// Maximum iterations reached in the tool-call loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Parse error (e.g., tool call parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}
