//! Arithmetic tool server spawned by the agent demo.
//!
//! Exposes two tools, `add` and `multiply`, each taking numbers `a` and `b`.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub const SERVER_NAME: &str = "math";

#[derive(Debug, Deserialize)]
struct BinaryArgs {
    a: f64,
    b: f64,
}

/// Supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Multiply,
}

impl MathOp {
    pub const ALL: [Self; 2] = [Self::Add, Self::Multiply];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Multiply => "multiply",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Self::Add => "Add two numbers",
            Self::Multiply => "Multiply two numbers",
        }
    }

    #[must_use]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Multiply => a * b,
        }
    }

    fn tool(self) -> Tool {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        });
        let schema = match schema {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Tool::new(self.name(), self.description(), Arc::new(schema))
    }
}

/// Render whole numbers without a trailing `.0` so `54 + 6` reads as `60`.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MathServer;

impl MathServer {
    #[must_use]
    pub fn tools() -> Vec<Tool> {
        MathOp::ALL.into_iter().map(MathOp::tool).collect()
    }

    pub fn call(
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, McpError> {
        let op = MathOp::from_name(name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {name}"), None))?;

        let args: BinaryArgs =
            serde_json::from_value(serde_json::Value::Object(arguments.unwrap_or_default()))
                .map_err(|e| {
                    McpError::invalid_params(format!("invalid arguments for {name}: {e}"), None)
                })?;

        let result = op.apply(args.a, args.b);
        info!(tool = name, a = args.a, b = args.b, result, "Tool evaluated");
        Ok(CallToolResult::success(vec![Content::text(format_number(result))]))
    }
}

impl ServerHandler for MathServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some("Basic arithmetic: add and multiply.".to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(Self::tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Self::call(&request.name, request.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: f64, b: f64) -> Option<serde_json::Map<String, serde_json::Value>> {
        json!({ "a": a, "b": b }).as_object().cloned()
    }

    #[test]
    fn test_tools_listed() {
        let names: Vec<_> = MathServer::tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, ["add", "multiply"]);
    }

    #[test]
    fn test_apply() {
        assert!((MathOp::Add.apply(54.0, 6.0) - 60.0).abs() < f64::EPSILON);
        assert!((MathOp::Multiply.apply(2.0, 3.0) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(60.0), "60");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_call_success() {
        let result = MathServer::call("multiply", args(2.0, 3.0)).unwrap();
        assert_ne!(result.is_error, Some(true));
    }

    #[test]
    fn test_call_unknown_tool() {
        let err = MathServer::call("divide", args(1.0, 2.0)).unwrap_err();
        assert!(err.message.contains("divide"));
    }

    #[test]
    fn test_call_missing_argument() {
        let err = MathServer::call("add", json!({ "a": 1 }).as_object().cloned()).unwrap_err();
        assert!(err.message.contains("add"));
    }
}
