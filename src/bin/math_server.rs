//! Arithmetic MCP tool server over stdio.

use dotenvy::dotenv;
use mimalloc::MiMalloc;
use poke_mcp::{
    math::{MathServer, SERVER_NAME},
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

    info!(name: "math.starting", server = SERVER_NAME, "Starting math MCP server on stdio");

    let service = MathServer
        .serve(stdio())
        .await
        .inspect_err(|e| error!(error = %e, "Failed to start MCP session"))?;

    let reason = service.waiting().await?;
    info!(reason = ?reason, "Math server stopped");
    Ok(())
}
