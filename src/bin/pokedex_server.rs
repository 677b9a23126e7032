//! Mini Pokédex Lite: MCP resource server over stdio.

use anyhow::Context;
use dotenvy::dotenv;
use mimalloc::MiMalloc;
use poke_mcp::{
    config::PokedexConfig,
    pokedex::{
        Pokedex, PokedexServer,
        server::{SERVER_NAME, startup_banner},
    },
    telemetry::init_tracing,
};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{error, info};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv();
    init_tracing("info,rmcp=warn");

    let config = PokedexConfig::load().context("invalid Pokédex configuration")?;
    let pokedex = Pokedex::from_config(&config)?;

    eprintln!("{}", startup_banner(pokedex.api().base_url().as_str()));
    info!(
        name: "pokedex.starting",
        server = SERVER_NAME,
        version = env!("CARGO_PKG_VERSION"),
        upstream = %pokedex.api().base_url(),
        "Starting Mini Pokédex Lite MCP server on stdio"
    );

    let service = PokedexServer::new(pokedex)
        .serve(stdio())
        .await
        .inspect_err(|e| error!(error = %e, "Failed to start MCP session"))?;

    let reason = service.waiting().await?;
    info!(reason = ?reason, "Pokédex server stopped");
    Ok(())
}
