//! MCP crash-course demos
//!
//! Two small Model Context Protocol programs sharing one crate:
//!
//! - **Agent client** (`mcp-agent`): spawns an MCP server over stdio, discovers
//!   its tools and lets an LLM agent call them to answer one question.
//! - **Pokédex server** (`pokedex-server`): read-only `poke://` resources
//!   proxying the public PokéAPI.
//!
//! A third binary, `math-server`, provides the `add`/`multiply` tools the
//! agent uses by default.
//!
//! # Modules
//!
//! - [`config`]: layered configuration for the agent and the Pokédex
//! - [`llm`]: LLM driver trait, Chat Completions driver and tool-loop orchestrator
//! - [`mcp`]: stdio MCP session and tool catalog
//! - [`normalized`]: streaming event model
//! - [`pokedex`]: resource records, upstream client and MCP handler
//! - [`math`]: arithmetic tool server
//! - [`telemetry`]: tracing setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod llm;
pub mod math;
pub mod mcp;
pub mod normalized;
pub mod pokedex;
pub mod telemetry;
