//! Application configuration

use std::time::Duration;

use agent_core::error::{AgentError, Result};
use agent_core::provider::GenerationOptions;
use agent_core::SessionConfig;
use agent_runtime::OllamaConfig;

use crate::cli::Cli;

/// Everything the binary needs to start a session
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub ollama: OllamaConfig,
}

impl AppConfig {
    /// Combine parsed arguments with the Ollama environment
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::build(cli, OllamaConfig::from_env())
    }

    fn build(cli: &Cli, ollama: OllamaConfig) -> Result<Self> {
        let mut generation = GenerationOptions {
            model: cli.model.clone(),
            ..Default::default()
        };

        if let Some(temperature) = cli.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AgentError::Config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
            generation.temperature = temperature;
        }

        let session = SessionConfig {
            mode: cli.mode,
            system_prompt: cli.system_prompt.clone(),
            max_iterations: cli.max_iterations,
            backend_timeout: Duration::from_secs(cli.backend_timeout),
            tool_timeout: Duration::from_secs(cli.tool_timeout),
            generation,
        };
        session.validate()?;

        Ok(Self { session, ollama })
    }
}
