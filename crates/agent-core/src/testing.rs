//! Test doubles shared by the unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, BackendError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ProviderInfo};
use crate::tool::{ParamType, ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};

/// Echoes `text`, `repeat` times
pub struct EchoTool {
    name: String,
    description: String,
}

impl EchoTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            description: "Echo the input".into(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: vec![
                ParameterSchema::required("text", ParamType::String, "Text to echo"),
                ParameterSchema::optional("repeat", ParamType::Integer, "Repetitions").with_default(1),
            ],
            category: None,
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let text = call.str_arg("text").unwrap_or_default();
        let repeat = call
            .arguments
            .get("repeat")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(1);
        Ok(ToolResult::success(&self.name, text.repeat(repeat as usize)))
    }
}

fn no_params(name: &str) -> ToolSchema {
    ToolSchema {
        name: name.into(),
        description: format!("{name} test tool"),
        parameters: Vec::new(),
        category: None,
        has_side_effects: false,
    }
}

/// Always returns an error
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn schema(&self) -> ToolSchema {
        no_params("failing")
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        Err(AgentError::Other("disk on fire".into()))
    }
}

/// Always panics
pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn schema(&self) -> ToolSchema {
        no_params("panicking")
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        panic!("boom");
    }
}

/// Sleeps before answering
pub struct SlowTool {
    delay: Duration,
}

impl SlowTool {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn schema(&self) -> ToolSchema {
        no_params("slow")
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        tokio::time::sleep(self.delay).await;
        Ok(ToolResult::success("slow", "done"))
    }
}

/// Blocks its thread without yielding
pub struct BlockingTool {
    delay: Duration,
}

impl BlockingTool {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Tool for BlockingTool {
    fn schema(&self) -> ToolSchema {
        no_params("blocking")
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        std::thread::sleep(self.delay);
        Ok(ToolResult::success("blocking", "finished anyway"))
    }
}

/// What the provider saw on one `complete` call
#[derive(Clone, Debug)]
pub struct Request {
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

/// Provider that replays a fixed script of replies
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion>>>,
    fallback: Option<Completion>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// Reply with `completion` forever
    pub fn always(completion: Completion) -> Self {
        Self {
            fallback: Some(completion),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            version: None,
            models: Vec::new(),
            supports_tools: true,
        })
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests.lock().unwrap().push(Request {
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(BackendError::Provider("script exhausted".into()).into()),
        }
    }
}
