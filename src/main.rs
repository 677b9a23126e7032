//! MCP agent client
//!
//! Spawns an MCP server over stdio, loads its tools and asks an LLM agent one
//! question. The final answer is printed on stdout; logs go to stderr.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{error, info};

use poke_mcp::config::{AgentConfig, ConfigError};
use poke_mcp::llm::{LlmSettings, Orchestrator};
use poke_mcp::mcp::ToolSession;
use poke_mcp::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();
    init_tracing("info,rmcp=warn");

    let (config, settings) = match load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(name: "agent.config.invalid", error = %e, "Configuration error");
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = %settings.provider,
        "LLM configuration loaded"
    );

    run(&config, settings).await
}

fn load_config() -> Result<(AgentConfig, LlmSettings), ConfigError> {
    let config = AgentConfig::load()?;
    let settings = config.llm_settings()?;
    Ok((config, settings))
}

async fn run(config: &AgentConfig, settings: LlmSettings) -> anyhow::Result<()> {
    let session = Arc::new(ToolSession::connect(&config.server).await?);
    info!(
        name: "mcp.session.initialized",
        server = %session.server_name(),
        tools = ?session.tool_names(),
        "Session initialized"
    );

    let orchestrator = Orchestrator::new(settings, Arc::clone(&session));
    let result = orchestrator.answer(&config.question).await;

    // Tear the child down whether or not the agent succeeded.
    drop(orchestrator);
    if let Ok(session) = Arc::try_unwrap(session) {
        session.close().await?;
    }

    let answer = result?;
    println!("{answer}");
    Ok(())
}
