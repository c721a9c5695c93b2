//! Reasoning Strategies
//!
//! A [`ReasoningMode`] decides how a session prompts the model and whether
//! tools are offered:
//!
//! - `chat`: plain multi-turn conversation
//! - `tools`: function calling through the tool registry
//! - `react`: the model narrates Thought / Action / Observation steps while
//!   the session runs the actual tool-call loop
//!
//! The narrated ReAct steps can be parsed into a [`ReactTrace`] and checked.

use std::fmt;
use std::str::FromStr;

use crate::error::{AgentError, Result};

const CHAT_PROMPT: &str = "You are a helpful AI assistant.
Provide clear, concise answers and maintain context throughout the conversation.";

const TOOLS_PROMPT: &str = "You are an AI assistant with access to tools.
Use these tools when appropriate to help the user.
If you can answer directly without tools, do so.
Be concise and accurate.";

const REACT_PROMPT: &str = "You are a ReAct agent that follows this pattern:

For each step:
1. Thought: Explain your reasoning about what to do next
2. Action: Choose a tool to use
3. Observation: Analyze the result from the action

Continue this loop until you can provide a final answer.

Format your response showing Thought, Action, and Observation for each step.
When ready to answer, start the last line with \"Final Answer:\".";

/// How the agent reasons about a turn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReasoningMode {
    /// Conversation only, no tools
    Chat,
    /// Function calling
    #[default]
    Tools,
    /// Prompt-driven Reason-Act-Observe narration on top of function calling
    React,
}

impl ReasoningMode {
    pub const ALL: [ReasoningMode; 3] = [ReasoningMode::Chat, ReasoningMode::Tools, ReasoningMode::React];

    /// Default system prompt for this mode
    pub fn system_prompt(self) -> &'static str {
        match self {
            ReasoningMode::Chat => CHAT_PROMPT,
            ReasoningMode::Tools => TOOLS_PROMPT,
            ReasoningMode::React => REACT_PROMPT,
        }
    }

    /// Whether tool declarations are sent to the backend
    pub fn offers_tools(self) -> bool {
        !matches!(self, ReasoningMode::Chat)
    }

    /// Names of the built-in tools this mode registers
    pub fn builtin_tools(self) -> &'static [&'static str] {
        match self {
            ReasoningMode::Chat => &[],
            ReasoningMode::Tools => &["get_current_time", "calculate", "search_info"],
            ReasoningMode::React => &["search", "calculate"],
        }
    }

    /// Startup line shown by the console loop
    pub fn banner(self) -> &'static str {
        match self {
            ReasoningMode::Chat => "Simple Agent started. Type 'exit' to quit.",
            ReasoningMode::Tools => "Function Calling Agent started. Type 'exit' to quit.",
            ReasoningMode::React => "ReAct Agent started. Type 'exit' to quit.",
        }
    }

    /// Sample questions shown under the banner
    pub fn examples(self) -> &'static [&'static str] {
        match self {
            ReasoningMode::Chat => &[],
            ReasoningMode::Tools => &[
                "What time is it?",
                "What is 15 * 24?",
                "Search for Python tutorials",
            ],
            ReasoningMode::React => &[
                "What is Python and how popular is it?",
                "Calculate 15 * 24 + 100",
                "Tell me about Gemini",
            ],
        }
    }

    /// Whether the console announces that the agent is working
    pub fn announces_thinking(self) -> bool {
        matches!(self, ReasoningMode::React)
    }
}

impl fmt::Display for ReasoningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasoningMode::Chat => write!(f, "chat"),
            ReasoningMode::Tools => write!(f, "tools"),
            ReasoningMode::React => write!(f, "react"),
        }
    }
}

impl FromStr for ReasoningMode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" | "simple" => Ok(ReasoningMode::Chat),
            "tools" | "function-calling" => Ok(ReasoningMode::Tools),
            "react" => Ok(ReasoningMode::React),
            other => Err(AgentError::Config(format!(
                "unknown mode '{}' (expected chat, tools or react)",
                other
            ))),
        }
    }
}

/// Kind of a narrated ReAct step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Thought,
    Action,
    Observation,
    FinalAnswer,
}

impl StepKind {
    fn label(self) -> &'static str {
        match self {
            StepKind::Thought => "thought",
            StepKind::Action => "action",
            StepKind::Observation => "observation",
            StepKind::FinalAnswer => "final answer",
        }
    }

    /// Allowed successor kinds
    pub fn may_precede(self, next: StepKind) -> bool {
        use StepKind::*;
        match self {
            Thought => matches!(next, Action | FinalAnswer),
            Action => matches!(next, Observation),
            Observation => matches!(next, Thought | Action | FinalAnswer),
            FinalAnswer => false,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One narrated step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactStep {
    pub kind: StepKind,
    pub text: String,
}

/// Thought/Action/Observation steps extracted from a reply
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactTrace {
    steps: Vec<ReactStep>,
}

const LABELS: [StepKind; 4] = [
    StepKind::Thought,
    StepKind::Action,
    StepKind::Observation,
    StepKind::FinalAnswer,
];

/// Match `Thought:`, `**Action:**`, `2. Observation:` and the like
fn split_label(line: &str) -> Option<(StepKind, &str)> {
    let cleaned = line.trim_start_matches(|c: char| {
        c == '*' || c == '#' || c == '-' || c == '.' || c.is_ascii_digit() || c.is_whitespace()
    });

    LABELS.into_iter().find_map(|kind| {
        let label = kind.label();
        let head = cleaned.get(..label.len())?;
        if !head.eq_ignore_ascii_case(label) {
            return None;
        }
        let rest = cleaned[label.len()..].trim_start_matches('*');
        let rest = rest.strip_prefix(':')?;
        Some((kind, rest.trim_start_matches('*').trim()))
    })
}

impl ReactTrace {
    /// Parse the narrated steps out of a reply. Text before the first label
    /// is ignored; unlabeled lines continue the current step.
    pub fn parse(text: &str) -> Self {
        let mut steps: Vec<ReactStep> = Vec::new();

        for line in text.lines() {
            if let Some((kind, rest)) = split_label(line) {
                steps.push(ReactStep {
                    kind,
                    text: rest.to_string(),
                });
            } else if let Some(current) = steps.last_mut() {
                let line = line.trim();
                if !line.is_empty() {
                    if !current.text.is_empty() {
                        current.text.push('\n');
                    }
                    current.text.push_str(line);
                }
            }
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[ReactStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps of the given kind
    pub fn count(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.kind == StepKind::FinalAnswer)
            .map(|s| s.text.as_str())
    }

    /// Check that every step may follow its predecessor
    pub fn validate(&self) -> Result<()> {
        if let Some(first) = self.steps.first() {
            if first.kind == StepKind::Observation {
                return Err(AgentError::Parse(
                    "ReAct trace cannot start with an observation".into(),
                ));
            }
        }

        for pair in self.steps.windows(2) {
            let (prev, next) = (pair[0].kind, pair[1].kind);
            if !prev.may_precede(next) {
                return Err(AgentError::Parse(format!(
                    "ReAct step '{}' cannot be followed by '{}'",
                    prev, next
                )));
            }
        }

        Ok(())
    }
}
