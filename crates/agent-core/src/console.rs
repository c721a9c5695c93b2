//! Console Loop
//!
//! Line-oriented driver around a [`ConversationSession`]: read a line,
//! send it, print the reply, repeat until an exit word or end of input.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::reasoning::{ReactTrace, ReasoningMode, StepKind};
use crate::session::ConversationSession;

/// Words that end the loop (compared case-insensitively)
pub const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

const PROMPT: &str = "You: ";
const FAREWELL: &str = "Agent: Goodbye!";

/// What a line of input means to the loop
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Exit,
    Blank,
    Message(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Input::Blank
        } else if EXIT_WORDS.iter().any(|w| trimmed.eq_ignore_ascii_case(w)) {
            Input::Exit
        } else {
            Input::Message(trimmed)
        }
    }
}

/// Whether the loop keeps going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Read/send/print loop over any async line source and sink
pub struct AgentLoop<R, W> {
    session: ConversationSession,
    reader: R,
    writer: W,
    turns: usize,
}

impl<R, W> AgentLoop<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(session: ConversationSession, reader: R, writer: W) -> Self {
        Self {
            session,
            reader,
            writer,
            turns: 0,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn into_session(self) -> ConversationSession {
        self.session
    }

    /// Turns sent to the session so far, failed ones included
    pub fn turns(&self) -> usize {
        self.turns
    }

    fn mode(&self) -> ReasoningMode {
        self.session.config().mode
    }

    async fn print(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Print the mode banner and example questions
    pub async fn greet(&mut self) -> Result<()> {
        let mode = self.mode();
        let mut banner = format!("{}\n\n", mode.banner());

        if !mode.examples().is_empty() {
            banner.push_str("Try asking:\n");
            for example in mode.examples() {
                banner.push_str(&format!("  - {}\n", example));
            }
            banner.push('\n');
        }

        self.print(&banner).await
    }

    /// Run until an exit word or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.greet().await?;
        while self.step().await? == LoopControl::Continue {}
        Ok(())
    }

    /// Prompt, read one line and act on it
    pub async fn step(&mut self) -> Result<LoopControl> {
        self.print(PROMPT).await?;

        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw).await? == 0 {
            self.print(&format!("\n{}\n", FAREWELL)).await?;
            return Ok(LoopControl::Exit);
        }

        let Ok(line) = String::from_utf8(raw) else {
            tracing::warn!("Skipping input line that is not valid UTF-8");
            self.print("Error: input is not valid UTF-8\n\n").await?;
            return Ok(LoopControl::Continue);
        };

        let text = match Input::classify(&line) {
            Input::Exit => {
                self.print(&format!("{}\n", FAREWELL)).await?;
                return Ok(LoopControl::Exit);
            }
            Input::Blank => return Ok(LoopControl::Continue),
            Input::Message(text) => text.to_string(),
        };

        if self.mode().announces_thinking() {
            self.print("\nAgent thinking...\n\n").await?;
        }

        self.turns += 1;
        match self.session.send(&text).await {
            Ok(reply) => {
                if self.mode() == ReasoningMode::React {
                    log_trace(&reply);
                }
                self.print(&format!("Agent: {}\n\n", reply)).await?;
            }
            Err(e) => {
                self.print(&format!("Error: {}\n\n", e)).await?;
            }
        }

        Ok(LoopControl::Continue)
    }
}

fn log_trace(reply: &str) {
    let trace = ReactTrace::parse(reply);
    if trace.is_empty() {
        tracing::debug!("Reply carries no ReAct narration");
        return;
    }

    match trace.validate() {
        Ok(()) => tracing::debug!(
            thoughts = trace.count(StepKind::Thought),
            actions = trace.count(StepKind::Action),
            observations = trace.count(StepKind::Observation),
            answered = trace.final_answer().is_some(),
            "ReAct trace"
        ),
        Err(e) => tracing::warn!(error = %e, "Malformed ReAct trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::error::BackendError;
    use crate::message::Role;
    use crate::provider::Completion;
    use crate::testing::ScriptedProvider;
    use crate::tool::ToolCall;
    use std::sync::Arc;

    fn session(provider: Arc<ScriptedProvider>, mode: ReasoningMode) -> ConversationSession {
        ConversationSession::builder()
            .provider(provider)
            .tools(builtin::registry_for(mode).unwrap())
            .mode(mode)
            .build()
            .unwrap()
    }

    async fn run(provider: Arc<ScriptedProvider>, mode: ReasoningMode, input: &str) -> (String, ConversationSession) {
        let mut output = Vec::new();
        let mut agent = AgentLoop::new(session(provider, mode), input.as_bytes(), &mut output);
        agent.run().await.unwrap();
        let session = agent.into_session();
        (String::from_utf8(output).unwrap(), session)
    }

    #[test]
    fn test_classify() {
        assert_eq!(Input::classify("   \n"), Input::Blank);
        assert_eq!(Input::classify("EXIT\n"), Input::Exit);
        assert_eq!(Input::classify("Quit"), Input::Exit);
        assert_eq!(Input::classify(" bye \n"), Input::Exit);
        assert_eq!(Input::classify("exit now\n"), Input::Message("exit now"));
        assert_eq!(Input::classify("  hello \n"), Input::Message("hello"));
    }

    #[tokio::test]
    async fn test_blank_input_sends_nothing() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (output, session) = run(provider.clone(), ReasoningMode::Chat, "   \n\t\nexit\n").await;

        assert_eq!(provider.call_count(), 0);
        assert_eq!(output.matches(PROMPT).count(), 3);
        assert!(output.ends_with("Agent: Goodbye!\n"));
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_exit_any_case_stops_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (output, _) = run(provider.clone(), ReasoningMode::Tools, "ExIt\nWhat is 2 + 2?\n").await;

        assert_eq!(provider.call_count(), 0);
        assert!(output.contains("Agent: Goodbye!"));
        assert!(output.contains("Function Calling Agent started."));
    }

    #[tokio::test]
    async fn test_reply_is_printed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::tool_use(vec![ToolCall::new("calculate").arg("expression", "15 * 24")])),
            Ok(Completion::text("15 * 24 is 360.")),
        ]));
        let (output, _) = run(provider, ReasoningMode::Tools, "What is 15 * 24?\nquit\n").await;

        assert!(output.contains("Agent: 15 * 24 is 360.\n"));
    }

    #[tokio::test]
    async fn test_backend_error_does_not_end_loop() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Completion::text("Hi Ada")),
            Err(BackendError::Unavailable("network down".into()).into()),
            Ok(Completion::text("Your name is Ada")),
        ]));
        let (output, session) = run(
            provider,
            ReasoningMode::Chat,
            "My name is Ada\nhello?\nWhat is my name?\nbye\n",
        )
        .await;

        assert!(output.contains("Error: Backend error: backend unavailable: network down"));
        assert!(output.contains("Agent: Your name is Ada"));

        let users: Vec<_> = session
            .history()
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(users, vec!["My name is Ada", "hello?", "What is my name?"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let provider = Arc::new(ScriptedProvider::always(Completion::text("hi")));
        let mut output = Vec::new();
        let mut agent = AgentLoop::new(
            session(provider.clone(), ReasoningMode::Chat),
            &b"\xff\xfe bad\nhello\nexit\n"[..],
            &mut output,
        );
        agent.run().await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(agent.turns(), 1);
        drop(agent);
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Error: input is not valid UTF-8"));
        assert!(output.contains("Agent: hi"));
        assert!(output.ends_with("Agent: Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("ok"))]));
        let mut output = Vec::new();
        let mut agent = AgentLoop::new(session(provider, ReasoningMode::Chat), &b"hello"[..], &mut output);
        agent.run().await.unwrap();

        assert_eq!(agent.turns(), 1);
        drop(agent);
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Agent: ok"));
        assert!(output.ends_with("Agent: Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_react_mode_announces_thinking() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text(
            "Thought: easy\nFinal Answer: 4",
        ))]));
        let (output, _) = run(provider, ReasoningMode::React, "2+2?\nexit\n").await;

        assert!(output.contains("ReAct Agent started."));
        assert!(output.contains("Agent thinking..."));
        assert!(output.contains("Final Answer: 4"));
    }
}
