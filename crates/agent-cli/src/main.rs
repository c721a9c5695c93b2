//! agent-chat
//!
//! Console front end: one conversation with a local Ollama model, in chat,
//! tools or react mode.

mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{builtin, AgentLoop, ConversationSession, LlmProvider};
use agent_runtime::OllamaProvider;

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before parsing so .env values act as flag fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing; stdout belongs to the conversation
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_cli(&cli)?;
    let mode = config.session.mode;

    let tools = builtin::registry_for(mode)?;

    if cli.list_tools {
        println!("Tools available in {} mode:", mode);
        for schema in tools.schemas() {
            println!("  {:<18} {}", schema.name, schema.description);
        }
        return Ok(());
    }

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    // Initialize LLM provider
    let provider = Arc::new(OllamaProvider::from_config(config.ollama.clone()));

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to Ollama at {}:{}", config.ollama.host, config.ollama.port);
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Ollama not available - turns will fail until it is reachable");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    let session = ConversationSession::new(provider, Arc::new(tools), config.session)?;

    let mut agent = AgentLoop::new(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    agent.run().await?;

    tracing::info!(turns = agent.turns(), "Session ended");

    Ok(())
}
