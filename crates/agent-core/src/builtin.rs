//! Built-in Tools
//!
//! The stock capabilities offered by the `tools` and `react` modes. Both
//! modes search, but only `react` answers from a small knowledge base.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::calc;
use crate::error::{AgentError, Result};
use crate::reasoning::ReasoningMode;
use crate::tool::{ParamType, ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};

/// Current local time
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_time".into(),
            description: "Get the current local time".into(),
            parameters: vec![
                ParameterSchema::optional(
                    "format",
                    ParamType::String,
                    "Output format: 'time' (HH:MM:SS), 'iso', 'human', or 'unix'",
                )
                .with_default("time")
                .with_enum(vec![json!("time"), json!("iso"), json!("human"), json!("unix")]),
            ],
            category: Some("time".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let format = call.str_arg("format").unwrap_or("time");
        let now = chrono::Local::now();

        let output = match format {
            "iso" => now.to_rfc3339(),
            "unix" => now.timestamp().to_string(),
            "human" => now.format("%A, %B %d, %Y at %H:%M:%S").to_string(),
            _ => now.format("%H:%M:%S").to_string(),
        };

        Ok(ToolResult::success("get_current_time", output))
    }
}

/// Arithmetic over `+ - * / ( )`
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "calculate".into(),
            description: "Evaluate an arithmetic expression using + - * / and parentheses".into(),
            parameters: vec![ParameterSchema::required(
                "expression",
                ParamType::String,
                "Mathematical expression to evaluate (e.g., '15 * 24', '(2 + 3) / 4')",
            )],
            category: Some("math".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let expr = call
            .str_arg("expression")
            .ok_or_else(|| AgentError::ToolValidation("Missing expression".into()))?;

        let value = calc::evaluate(expr)
            .map_err(|e| AgentError::ToolExecution(format!("cannot evaluate '{}': {}", expr, e)))?;

        Ok(ToolResult::success("calculate", calc::format_number(value)).with_data(json!(value)))
    }
}

const KNOWLEDGE: [(&str, &str); 3] = [
    (
        "python",
        "Python is a high-level programming language created by Guido van Rossum in 1991.",
    ),
    (
        "ai",
        "Artificial Intelligence is the simulation of human intelligence by machines.",
    ),
    ("gemini", "Gemini is Google's family of multimodal AI models."),
];

/// Simulated information lookup
pub struct SearchTool;

impl SearchTool {
    fn lookup(query: &str) -> String {
        let lower = query.to_lowercase();
        KNOWLEDGE
            .iter()
            .find(|(key, _)| lower.contains(key))
            .map(|(_, text)| (*text).to_string())
            .unwrap_or_else(|| format!("Search results for '{}': Information about {}", query, query))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search".into(),
            description: "Search for information on a topic".into(),
            parameters: vec![ParameterSchema::required("query", ParamType::String, "Search query")],
            category: Some("knowledge".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let query = call
            .str_arg("query")
            .ok_or_else(|| AgentError::ToolValidation("Missing query".into()))?;

        Ok(ToolResult::success("search", Self::lookup(query)))
    }
}

/// Simulated search without a knowledge base, offered in `tools` mode
pub struct SearchInfoTool;

#[async_trait]
impl Tool for SearchInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_info".into(),
            description: "Search for information (simulated)".into(),
            parameters: vec![ParameterSchema::required("query", ParamType::String, "Search query")],
            category: Some("knowledge".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let query = call
            .str_arg("query")
            .ok_or_else(|| AgentError::ToolValidation("Missing query".into()))?;

        Ok(ToolResult::success(
            "search_info",
            format!("Search results for '{}': [Relevant information would appear here]", query),
        ))
    }
}

/// Built-in tool by name
pub fn builtin(name: &str) -> Option<Arc<dyn Tool>> {
    match name {
        "get_current_time" => Some(Arc::new(DateTimeTool)),
        "calculate" => Some(Arc::new(CalculatorTool)),
        "search" => Some(Arc::new(SearchTool)),
        "search_info" => Some(Arc::new(SearchInfoTool)),
        _ => None,
    }
}

/// Registry holding the built-in tools of `mode`, in the mode's order
pub fn registry_for(mode: ReasoningMode) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for name in mode.builtin_tools() {
        let tool = builtin(name).ok_or_else(|| AgentError::ToolNotFound((*name).to_string()))?;
        registry.register_arc(tool)?;
    }
    Ok(registry)
}
