//! Configuration for the agent client and the Pokédex server.
//!
//! Both are layered with the `config` crate:
//! built-in defaults → optional config file → prefixed environment
//! (`AGENT_*` / `POKEDEX_*`, nested keys separated by `__`) → CLI flags.
//!
//! The LLM credential is read separately from `GROQ_API_KEY` and is required.

use std::ffi::OsString;

use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{LlmSettings, Provider};
use crate::mcp::config::StdioServerConfig;

/// Environment variable holding the LLM API credential.
pub const CREDENTIAL_VAR: &str = "GROQ_API_KEY";

pub const DEFAULT_QUESTION: &str = "What is 54 + 2 * 3?";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_LLM_MODEL: &str = "qwen/qwen3-32b";
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

pub const DEFAULT_POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TYPE_LISTING_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The credential is absent or blank.
    #[error("missing required environment variable {var}")]
    MissingCredential { var: &'static str },

    #[error("invalid command line: {0}")]
    Cli(#[from] clap::Error),

    #[error(transparent)]
    Layered(#[from] config::ConfigError),
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Ask an LLM agent a question using tools from a spawned MCP server", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Command that starts the MCP server over stdio
    #[arg(long, env = "MCP_SERVER_COMMAND")]
    pub server_command: Option<String>,

    /// Argument passed to the MCP server (repeatable)
    #[arg(long = "server-arg")]
    pub server_args: Vec<String>,

    /// Question submitted to the agent
    #[arg(short, long)]
    pub question: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    /// Model identifier
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Maximum model turns before the agent gives up
    #[arg(long)]
    pub max_iterations: Option<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent client
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub server: StdioServerConfig,
    pub llm: LlmConfig,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server: StdioServerConfig::new(default_server_command()),
            llm: LlmConfig {
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                model: DEFAULT_LLM_MODEL.to_string(),
                temperature: 0.0,
                max_iterations: DEFAULT_MAX_ITERATIONS,
            },
            question: DEFAULT_QUESTION.to_string(),
        }
    }
}

/// The `math-server` executable built alongside the running binary.
fn default_server_command() -> String {
    let file_name = format!("math-server{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .map(|exe| exe.with_file_name(&file_name).to_string_lossy().into_owned())
        .unwrap_or(file_name)
}

impl AgentConfig {
    /// Load from the process arguments, exiting on `--help`/`--version`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(Cli::parse())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_cli(Cli::try_parse_from(args)?)
    }

    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("AGENT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their env aliases) win over everything else.
        if let Some(command) = cli.server_command {
            builder = builder.set_override("server.command", command)?;
        }
        if !cli.server_args.is_empty() {
            builder = builder.set_override("server.args", cli.server_args)?;
        }
        if let Some(question) = cli.question {
            builder = builder.set_override("question", question)?;
        }
        if let Some(base_url) = cli.base_url {
            builder = builder.set_override("llm.base_url", base_url)?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(max) = cli.max_iterations {
            builder = builder.set_override("llm.max_iterations", max.to_string())?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Combine with the credential from the environment.
    pub fn llm_settings(&self) -> Result<LlmSettings, ConfigError> {
        let api_key = std::env::var(CREDENTIAL_VAR)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingCredential {
                var: CREDENTIAL_VAR,
            })?;

        Ok(LlmSettings {
            provider: Provider::detect_from_url(&self.llm.base_url),
            base_url: self.llm.base_url.clone(),
            api_key: Some(api_key),
            model: self.llm.model.clone(),
            temperature: Some(self.llm.temperature),
            max_iterations: self.llm.max_iterations,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pokédex server
// ─────────────────────────────────────────────────────────────────────────────

/// Upstream settings for the Pokédex resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokedexConfig {
    /// PokéAPI root, e.g. `https://pokeapi.co/api/v2`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Maximum members returned by a type listing.
    pub type_listing_limit: usize,
}

impl Default for PokedexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_POKEAPI_BASE_URL.to_string(),
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            type_listing_limit: DEFAULT_TYPE_LISTING_LIMIT,
        }
    }
}

impl PokedexConfig {
    /// Defaults overridden by `POKEDEX_BASE_URL`, `POKEDEX_TIMEOUT_SECS`,
    /// `POKEDEX_TYPE_LISTING_LIMIT`.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(
                Environment::with_prefix("POKEDEX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli {
            server_command: Some("./pokedex-server".to_string()),
            server_args: vec!["--quiet".to_string()],
            question: Some("What is 2 + 2?".to_string()),
            model: Some("llama-3.3-70b-versatile".to_string()),
            max_iterations: Some(3),
            ..Cli::default()
        };

        let config = AgentConfig::from_cli(cli).unwrap();
        assert_eq!(config.server.command, "./pokedex-server");
        assert_eq!(config.server.args, vec!["--quiet"]);
        assert_eq!(config.question, "What is 2 + 2?");
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.max_iterations, 3);
    }

    #[test]
    fn test_default_server_command_is_math_server() {
        let config = AgentConfig::default();
        assert!(config.server.command.contains("math-server"));
        assert!(config.server.args.is_empty());
    }

    #[test]
    fn test_pokedex_defaults() {
        let config = PokedexConfig::default();
        assert_eq!(config.base_url, "https://pokeapi.co/api/v2");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.type_listing_limit, 10);
    }
}
