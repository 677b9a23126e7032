//! Model Context Protocol (MCP) client helpers.
//!
//! The agent talks to exactly one MCP server, launched as a child process and
//! spoken to over its stdin/stdout. The session, handshake and JSON-RPC framing
//! come from `rmcp`; this module only wires them up and adapts the tool catalog
//! for the LLM.
//!
//! # Tool naming
//!
//! Tool names are exposed to the model with every character outside
//! `[A-Za-z0-9_-]` replaced by `_` (e.g. `math.add` → `math_add`) and mapped
//! back to the server's own name on call.

pub mod config;
pub mod session;

pub use config::StdioServerConfig;
pub use session::{NativeTool, ToolSession};
