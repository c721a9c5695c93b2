//! Tool Invocation
//!
//! Runs one tool call and always produces a [`ToolResult`]. Validation
//! errors, errors returned by the tool, panics and timeouts all become
//! failure results so the conversation can carry on.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AgentError;
use crate::tool::{RegisteredTool, ToolCall, ToolRegistry, ToolResult};

/// Default per-call deadline
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes tool calls with validation and a deadline
#[derive(Clone, Debug)]
pub struct ToolInvoker {
    timeout: Duration,
}

impl Default for ToolInvoker {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

impl ToolInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve `call.name` in the registry and invoke it.
    ///
    /// A name the registry does not know is reported back as a failure result.
    pub async fn dispatch(&self, registry: &ToolRegistry, call: &ToolCall) -> ToolResult {
        match registry.resolve(&call.name) {
            Ok(tool) => self.invoke(tool, call).await,
            Err(e) => {
                tracing::warn!(tool = %call.name, "Model requested an unregistered tool");
                failure(call, &e)
            }
        }
    }

    /// Validate the arguments, then run the tool body under the deadline
    pub async fn invoke(&self, tool: &RegisteredTool, call: &ToolCall) -> ToolResult {
        let arguments = match tool.schema().validate(&call.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Rejected tool arguments");
                return failure(call, &e);
            }
        };

        let validated = ToolCall {
            name: tool.name().to_string(),
            arguments,
            id: call.id.clone(),
        };

        tracing::debug!(tool = %validated.name, id = ?validated.id, "Executing tool");

        // Own task: a body that blocks its thread still hits the deadline
        let name = validated.name.clone();
        let body = Arc::clone(tool.body());
        let mut handle = tokio::spawn(async move { body.execute(&validated).await });

        let outcome = tokio::time::timeout(self.timeout, &mut handle).await;
        let error = match outcome {
            Ok(Ok(Ok(mut result))) => {
                result.id = call.id.clone();
                return result;
            }
            Ok(Ok(Err(e))) => match e {
                AgentError::ToolExecution(_) => e,
                other => AgentError::ToolExecution(other.to_string()),
            },
            Ok(Err(join)) if join.is_panic() => AgentError::ToolExecution(format!(
                "tool panicked: {}",
                panic_message(join.into_panic().as_ref())
            )),
            Ok(Err(join)) => AgentError::ToolExecution(join.to_string()),
            Err(_) => {
                handle.abort();
                AgentError::ToolTimeout {
                    tool: name.clone(),
                    timeout: self.timeout,
                }
            }
        };

        tracing::warn!(tool = %name, error = %error, "Tool call failed");
        failure(call, &error)
    }
}

fn failure(call: &ToolCall, error: &AgentError) -> ToolResult {
    let mut result = ToolResult::failure(&call.name, format!("Error: {}", error));
    result.id = call.id.clone();
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
