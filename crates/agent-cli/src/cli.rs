//! CLI argument definitions

use agent_core::ReasoningMode;
use agent_core::session::DEFAULT_MAX_ITERATIONS;
use clap::Parser;

/// CLI arguments for agent-chat
#[derive(Parser, Debug)]
#[command(name = "agent-chat")]
#[command(author, version, about = "Conversational agent with tools, backed by a local Ollama model")]
#[command(long_about = r#"
Conversational agent with function calling, backed by a local Ollama model.

Modes:
  chat    plain multi-turn conversation
  tools   the model may call get_current_time, calculate and search_info
  react   the model narrates Thought / Action / Observation while using
          search and calculate

Every flag can also be set through the environment (or a .env file).
Type 'exit', 'quit' or 'bye' to leave.

Example:
  agent-chat --mode react --model qwen2.5
"#)]
pub struct Cli {
    /// Reasoning mode: chat, tools or react
    #[arg(short, long, env = "AGENT_MODE", default_value = "tools")]
    pub mode: ReasoningMode,

    /// Model to chat with
    #[arg(long, env = "AGENT_MODEL", default_value = "llama3.2")]
    pub model: String,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, env = "AGENT_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Maximum backend round trips per turn
    #[arg(long, env = "AGENT_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Seconds to wait for each model reply
    #[arg(long, value_name = "SECS", env = "AGENT_BACKEND_TIMEOUT_SECS", default_value_t = 120)]
    pub backend_timeout: u64,

    /// Seconds to wait for each tool call
    #[arg(long, value_name = "SECS", env = "AGENT_TOOL_TIMEOUT_SECS", default_value_t = 30)]
    pub tool_timeout: u64,

    /// Replace the mode's system prompt
    #[arg(long, env = "AGENT_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Print the tools of the selected mode and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Verbosity level (-v = info, -vv = debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
