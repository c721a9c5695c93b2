//! Tool System
//!
//! Extensible tool framework for agent capabilities.
//! Tools are registered once, declared to the backend in registration order,
//! and executed through the [`ToolInvoker`](crate::invoker::ToolInvoker).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            id: None,
        }
    }

    /// Add an argument
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// String argument lookup
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success payload or failure description)
    pub output: String,

    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Text fed back to the backend as an observation
    pub fn observation_text(&self) -> String {
        if self.success {
            format!("[Tool '{}' returned]\n{}", self.name, self.output)
        } else {
            format!("[Tool '{}' failed]\n{}", self.name, self.output)
        }
    }
}

/// JSON type of a declared parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Whether a JSON value has this type
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        };
        f.write_str(name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON type
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,

    /// Whether tool has side effects
    #[serde(default)]
    pub has_side_effects: bool,
}

impl ToolSchema {
    /// Check arguments against the declared parameters.
    ///
    /// Returns the normalized argument map: defaults are filled in and `null`
    /// optional arguments are dropped.
    pub fn validate(&self, arguments: &HashMap<String, Value>) -> Result<HashMap<String, Value>> {
        if let Some(unknown) = arguments
            .keys()
            .find(|key| !self.parameters.iter().any(|p| &p.name == *key))
        {
            return Err(AgentError::ToolValidation(format!(
                "Unknown parameter: {}",
                unknown
            )));
        }

        let mut normalized = HashMap::with_capacity(self.parameters.len());

        for param in &self.parameters {
            match arguments.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    if !param.param_type.accepts(value) {
                        return Err(AgentError::ToolValidation(format!(
                            "Parameter '{}' expects {}, got {}",
                            param.name,
                            param.param_type,
                            json_type_name(value)
                        )));
                    }
                    if let Some(allowed) = &param.enum_values {
                        if !allowed.contains(value) {
                            return Err(AgentError::ToolValidation(format!(
                                "Parameter '{}' must be one of {}",
                                param.name,
                                Value::Array(allowed.clone())
                            )));
                        }
                    }
                    normalized.insert(param.name.clone(), value.clone());
                }
                None if param.required => {
                    return Err(AgentError::ToolValidation(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                None => {
                    if let Some(default) = &param.default {
                        normalized.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(normalized)
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with already-validated arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// A tool frozen at registration time
#[derive(Clone)]
pub struct RegisteredTool {
    schema: ToolSchema,
    tool: Arc<dyn Tool>,
}

impl RegisteredTool {
    fn new(tool: Arc<dyn Tool>) -> Self {
        Self {
            schema: tool.schema(),
            tool,
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub(crate) fn body(&self) -> &Arc<dyn Tool> {
        &self.tool
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.schema.name)
            .finish_non_exhaustive()
    }
}

/// What to do when a tool name is registered twice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`AgentError::DuplicateTool`]
    #[default]
    Reject,
    /// Replace the existing tool, keeping its position
    Replace,
}

/// Registry for available tools, in registration order
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    policy: DuplicatePolicy,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let entry = RegisteredTool::new(tool);
        let name = entry.name().to_string();

        match (self.index.get(&name).copied(), self.policy) {
            (Some(_), DuplicatePolicy::Reject) => Err(AgentError::DuplicateTool(name)),
            (Some(pos), DuplicatePolicy::Replace) => {
                tracing::debug!(tool = %name, "Replacing registered tool");
                self.tools[pos] = entry;
                Ok(())
            }
            (None, _) => {
                tracing::debug!(tool = %name, "Registering tool");
                self.index.insert(name, self.tools.len());
                self.tools.push(entry);
                Ok(())
            }
        }
    }

    /// Resolve a tool by name
    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool> {
        self.index
            .get(name)
            .map(|&pos| &self.tools[pos])
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All tools in registration order
    pub fn list(&self) -> &[RegisteredTool] {
        &self.tools
    }

    /// Get all tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema.clone()).collect()
    }

    /// Get tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(RegisteredTool::name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate system prompt section describing available tools
    pub fn prompt_section(&self) -> String {
        prompt_section(&self.schemas())
    }
}

/// Render tool declarations for backends that only understand text.
///
/// The model is asked to answer with fenced ```` ```tool ```` blocks, which
/// [`parse_tool_calls`] reads back.
pub fn prompt_section(schemas: &[ToolSchema]) -> String {
    let mut prompt = String::from("## Available Tools\n\n");
    prompt.push_str("You can use the following tools by responding with a JSON block:\n\n");
    prompt.push_str("```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n");
    prompt.push_str("After receiving tool results, synthesize them into a helpful response.\n\n");

    for schema in schemas {
        prompt.push_str(&format!("### {}\n", schema.name));
        prompt.push_str(&format!("{}\n", schema.description));

        if !schema.parameters.is_empty() {
            prompt.push_str("**Parameters:**\n");
            for param in &schema.parameters {
                let required = if param.required { " (required)" } else { "" };
                prompt.push_str(&format!(
                    "- `{}` ({}){}: {}\n",
                    param.name, param.param_type, required, param.description
                ));
            }
        }
        prompt.push('\n');
    }

    prompt
}

/// Extract tool calls from model text.
///
/// Every ```` ```tool ```` block is read, in order. A block may hold one call
/// object or an array of them. Without any block, a reply consisting of a
/// single JSON call object is accepted. Calls without an ID get a fresh UUID.
pub fn parse_tool_calls(content: &str) -> Vec<ToolCall> {
    const TOOL_START: &str = "```tool";
    const TOOL_END: &str = "```";

    let mut calls = Vec::new();
    let mut rest = content;

    while let Some(start_idx) = rest.find(TOOL_START) {
        let after_marker = &rest[start_idx + TOOL_START.len()..];
        let Some(end_idx) = after_marker.find(TOOL_END) else {
            break;
        };
        let json_str = after_marker[..end_idx].trim();

        match serde_json::from_str::<Value>(json_str) {
            Ok(Value::Array(items)) => calls.extend(
                items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value::<ToolCall>(item).ok()),
            ),
            Ok(value) => calls.extend(serde_json::from_value::<ToolCall>(value).ok()),
            Err(e) => tracing::debug!(error = %e, "Ignoring malformed tool block"),
        }

        rest = &after_marker[end_idx + TOOL_END.len()..];
    }

    if calls.is_empty() {
        calls.extend(parse_inline_tool_call(content));
    }

    for call in &mut calls {
        if call.id.is_none() {
            call.id = Some(uuid::Uuid::new_v4().to_string());
        }
    }

    calls
}

/// Only a reply that is nothing but one JSON object counts as an inline call
fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    let trimmed = content.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }

    let value = serde_json::from_str::<Value>(trimmed).ok()?;
    if value.get("tool").is_none() && value.get("name").is_none() {
        return None;
    }

    serde_json::from_value::<ToolCall>(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EchoTool;
    use serde_json::json;

    fn echo_schema() -> ToolSchema {
        EchoTool::new("echo").schema()
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("first")).unwrap();
        registry.register(EchoTool::new("second")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("first").unwrap().name(), "first");
        assert_eq!(registry.resolve("second").unwrap().name(), "second");
        assert!(matches!(
            registry.resolve("unknown"),
            Err(AgentError::ToolNotFound(name)) if name == "unknown"
        ));
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid", "beta"] {
            registry.register(EchoTool::new(name)).unwrap();
        }

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid", "beta"]);
        let schema_names: Vec<_> = registry.schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(schema_names, vec!["zeta", "alpha", "mid", "beta"]);
    }

    #[test]
    fn test_duplicate_rejected_by_default() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo")).unwrap();

        let err = registry.register(EchoTool::new("echo")).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_replace_keeps_position() {
        let mut registry = ToolRegistry::with_policy(DuplicatePolicy::Replace);
        registry.register(EchoTool::new("a")).unwrap();
        registry.register(EchoTool::new("b")).unwrap();
        registry
            .register(EchoTool::new("a").with_description("replacement"))
            .unwrap();

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.resolve("a").unwrap().schema().description, "replacement");
    }

    #[test]
    fn test_validate_missing_required() {
        let err = echo_schema().validate(&HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("Missing required parameter: text"));
    }

    #[test]
    fn test_validate_wrong_type() {
        let args = HashMap::from([("text".to_string(), json!(42))]);
        let err = echo_schema().validate(&args).unwrap_err();
        assert!(err.to_string().contains("expects string, got number"));
    }

    #[test]
    fn test_validate_unknown_parameter() {
        let args = HashMap::from([
            ("text".to_string(), json!("hi")),
            ("bogus".to_string(), json!(true)),
        ]);
        let err = echo_schema().validate(&args).unwrap_err();
        assert!(err.to_string().contains("Unknown parameter: bogus"));
    }

    #[test]
    fn test_validate_fills_defaults() {
        let args = HashMap::from([("text".to_string(), json!("hi")), ("repeat".to_string(), Value::Null)]);
        let normalized = echo_schema().validate(&args).unwrap();
        assert_eq!(normalized.get("repeat"), Some(&json!(1)));
    }

    #[test]
    fn test_validate_enum() {
        let schema = ToolSchema {
            name: "clock".into(),
            description: "clock".into(),
            parameters: vec![ParameterSchema::optional("format", ParamType::String, "format")
                .with_enum(vec![json!("iso"), json!("unix")])],
            category: None,
            has_side_effects: false,
        };
        let args = HashMap::from([("format".to_string(), json!("weird"))]);
        assert!(schema.validate(&args).is_err());
    }

    #[test]
    fn test_parse_tool_call() {
        let content = r#"Let me check that for you.
```tool
{"tool": "calculate", "arguments": {"expression": "2 + 2"}}
```"#;

        let calls = parse_tool_calls(content);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "calculate");
        assert_eq!(calls[0].str_arg("expression"), Some("2 + 2"));
        assert!(calls[0].id.is_some());
    }

    #[test]
    fn test_parse_multiple_blocks_in_order() {
        let content = r#"```tool
{"tool": "search", "arguments": {"query": "python"}}
```
and then
```tool
[{"name": "calculate", "arguments": {"expression": "1+1"}, "id": "c2"}]
```"#;

        let calls = parse_tool_calls(content);
        let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["search", "calculate"]);
        assert_eq!(calls[1].id.as_deref(), Some("c2"));
    }

    #[test]
    fn test_parse_inline_and_plain_text() {
        let inline = r#"{"tool": "get_current_time", "arguments": {}}"#;
        assert_eq!(parse_tool_calls(inline)[0].name, "get_current_time");
        assert!(parse_tool_calls("The answer is 360.").is_empty());
    }

    #[test]
    fn test_prose_mentioning_the_protocol_is_not_a_call() {
        let reply = r#"To use a tool I would answer with {"tool": "calculate", "arguments": {"expression": "1+1"}}, but 1 + 1 is simply 2."#;
        assert!(parse_tool_calls(reply).is_empty());

        let padded = "  \n{\"tool\": \"search\", \"arguments\": {\"query\": \"ai\"}}\n";
        assert_eq!(parse_tool_calls(padded)[0].name, "search");
    }

    #[test]
    fn test_prompt_section_lists_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo")).unwrap();
        let prompt = registry.prompt_section();

        assert!(prompt.contains("### echo"));
        assert!(prompt.contains("`text` (string) (required)"));
    }
}
