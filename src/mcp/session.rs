use crate::mcp::config::{StdioServerConfig, expand_env_map};
use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, ReadResourceRequestParam, Tool},
    service::ServiceExt,
    transport::TokioChildProcess,
};
use std::{collections::HashMap, sync::Arc};
use tokio::process::Command;
use tracing::{debug, info};

/// A tool implemented in-process rather than by the MCP server.
#[async_trait]
pub trait NativeTool: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;
    async fn call(&self, args: serde_json::Value) -> anyhow::Result<serde_json::Value>;
}

type DynClientService = rmcp::service::RunningService<
    rmcp::service::RoleClient,
    Box<dyn rmcp::service::DynService<rmcp::service::RoleClient>>,
>;

/// One initialized MCP session with a stdio child process, plus its tool
/// catalog.
///
/// The child is killed when the session is closed or dropped.
pub struct ToolSession {
    server_name: String,
    service: Option<DynClientService>,
    // llm_tool_name -> server tool name
    tool_index: HashMap<String, String>,
    tools: Vec<(String, Tool)>, // (llm_tool_name, Tool), server order
    native_tools: HashMap<String, Arc<dyn NativeTool>>,
}

impl std::fmt::Debug for ToolSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSession")
            .field("server_name", &self.server_name)
            .field("connected", &self.service.is_some())
            .field("tool_count", &self.tools.len())
            .field("native_tool_count", &self.native_tools.len())
            .finish()
    }
}

impl ToolSession {
    /// Spawn the server, run the `initialize` handshake and fetch the tool
    /// catalog.
    pub async fn connect(cfg: &StdioServerConfig) -> anyhow::Result<Self> {
        let mut cmd = Command::new(&cfg.command);
        cmd.args(&cfg.args);
        for (k, v) in expand_env_map(&cfg.env) {
            cmd.env(k, v);
        }

        let transport = TokioChildProcess::new(cmd)
            .with_context(|| format!("failed to spawn MCP server '{}'", cfg.command))?;

        let service = ().into_dyn().serve(transport).await.with_context(|| {
            format!("failed to initialize MCP session with '{}'", cfg.command)
        })?;

        let server_name = service
            .peer_info()
            .map_or_else(|| cfg.command.clone(), |info| info.server_info.name.clone());
        info!(server = %server_name, "MCP session initialized");

        let tools = service
            .list_all_tools()
            .await
            .with_context(|| format!("tools/list failed for MCP server '{server_name}'"))?;

        let mut session = Self {
            server_name,
            service: Some(service),
            tool_index: HashMap::new(),
            tools: Vec::new(),
            native_tools: HashMap::new(),
        };
        for tool in tools {
            session.index_tool(tool);
        }
        Ok(session)
    }

    fn index_tool(&mut self, tool: Tool) {
        let raw_name = tool.name.to_string();
        // OpenAI-style function names must match ^[a-zA-Z0-9_-]+$
        let llm_name = Self::sanitize_tool_name(&raw_name);
        debug!(server = %self.server_name, tool = %raw_name, llm_name = %llm_name, "Tool discovered");
        self.tool_index.insert(llm_name.clone(), raw_name);
        self.tools.push((llm_name, tool));
    }

    /// Creates a session with no server, for in-process tools only.
    pub fn new_empty() -> Self {
        Self {
            server_name: "native".to_string(),
            service: None,
            tool_index: HashMap::new(),
            tools: Vec::new(),
            native_tools: HashMap::new(),
        }
    }

    fn sanitize_tool_name(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The tool catalog as `(llm_tool_name, Tool)`, in server order.
    pub fn tools(&self) -> &[(String, Tool)] {
        &self.tools
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[must_use]
    pub fn with_native_tool(mut self, tool: Arc<dyn NativeTool>) -> Self {
        let llm_name = Self::sanitize_tool_name(tool.name());
        let mcp_tool = Tool::new(
            tool.name().to_string(),
            tool.description().to_string(),
            Arc::new(
                tool.schema()
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            ),
        );
        self.tools.push((llm_name.clone(), mcp_tool));
        self.native_tools.insert(llm_name, tool);
        self
    }

    pub fn openai_tools_json(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|(llm_name, t)| {
                // rmcp Tool uses input_schema as an Arc<JsonObject>; convert to serde_json.
                let params = serde_json::to_value(&*t.input_schema)
                    .unwrap_or_else(|_| serde_json::json!({"type":"object","properties":{}}));

                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": llm_name,
                        "description": t.description.as_deref().unwrap_or(""),
                        "parameters": params
                    }
                })
            })
            .collect()
    }

    fn service(&self) -> anyhow::Result<&DynClientService> {
        self.service
            .as_ref()
            .ok_or_else(|| anyhow!("no MCP server attached to this session"))
    }

    /// Invoke a tool by its LLM-facing name and return its text output.
    ///
    /// A result flagged `isError` by the server is returned as `Err`.
    pub async fn call_tool(
        &self,
        llm_tool_name: &str,
        arguments: serde_json::Value,
    ) -> anyhow::Result<String> {
        if let Some(tool) = self.native_tools.get(llm_tool_name) {
            let value = tool.call(arguments).await?;
            return Ok(match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
        }

        let raw_tool_name = self
            .tool_index
            .get(llm_tool_name)
            .ok_or_else(|| anyhow!("unknown tool: {llm_tool_name}"))?;

        let res = self
            .service()?
            .call_tool(CallToolRequestParam {
                name: raw_tool_name.clone().into(),
                arguments: arguments.as_object().cloned(),
            })
            .await
            .with_context(|| format!("tools/call failed for {}::{raw_tool_name}", self.server_name))?;

        let is_error = res.is_error.unwrap_or(false);
        let text = text_parts(&serde_json::to_value(&res)?, "content")
            .unwrap_or_else(|| serde_json::to_string(&res).unwrap_or_default());

        if is_error {
            bail!("{raw_tool_name} reported an error: {text}");
        }
        Ok(text)
    }

    /// Locators of the server's concrete resources.
    pub async fn list_resources(&self) -> anyhow::Result<Vec<String>> {
        let resources = self
            .service()?
            .list_all_resources()
            .await
            .with_context(|| format!("resources/list failed for {}", self.server_name))?;
        Ok(resources.into_iter().map(|r| r.raw.uri).collect())
    }

    /// Read a resource and return its text contents.
    pub async fn read_resource(&self, uri: &str) -> anyhow::Result<String> {
        let res = self
            .service()?
            .read_resource(ReadResourceRequestParam {
                uri: uri.to_string(),
            })
            .await
            .with_context(|| format!("resources/read failed for {uri}"))?;

        text_parts(&serde_json::to_value(&res)?, "contents")
            .ok_or_else(|| anyhow!("resource {uri} has no text contents"))
    }

    /// End the session and wait for the child to be torn down.
    pub async fn close(mut self) -> anyhow::Result<()> {
        if let Some(service) = self.service.take() {
            let reason = service.cancel().await.context("MCP session task panicked")?;
            info!(server = %self.server_name, reason = ?reason, "MCP session closed");
        }
        Ok(())
    }
}

/// Join the `text` fields of `value[key][*]`.
fn text_parts(value: &serde_json::Value, key: &str) -> Option<String> {
    let parts: Vec<&str> = value
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(serde_json::Value::as_str))
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl NativeTool for Echo {
        fn name(&self) -> &str {
            "echo.text"
        }
        fn description(&self) -> &str {
            "Echo the input"
        }
        fn schema(&self) -> serde_json::Value {
            json!({ "type": "object", "properties": { "text": { "type": "string" } } })
        }
        async fn call(&self, args: serde_json::Value) -> anyhow::Result<serde_json::Value> {
            Ok(args["text"].clone())
        }
    }

    #[test]
    fn test_sanitize_tool_name() {
        assert_eq!(ToolSession::sanitize_tool_name("math::add.v2"), "math__add_v2");
        assert_eq!(ToolSession::sanitize_tool_name("get-weather_1"), "get-weather_1");
    }

    #[test]
    fn test_openai_tools_json() {
        let session = ToolSession::new_empty().with_native_tool(Arc::new(Echo));
        let tools = session.openai_tools_json();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "echo_text");
        assert_eq!(tools[0]["function"]["description"], "Echo the input");
        assert_eq!(tools[0]["function"]["parameters"]["type"], "object");
    }

    #[tokio::test]
    async fn test_native_tool_call() {
        let session = ToolSession::new_empty().with_native_tool(Arc::new(Echo));
        let out = session.call_tool("echo_text", json!({ "text": "hi" })).await.unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let session = ToolSession::new_empty();
        let err = session.call_tool("nope", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_resources_need_server() {
        let session = ToolSession::new_empty();
        assert!(session.read_resource("poke://starters").await.is_err());
    }

    #[test]
    fn test_text_parts() {
        let value = json!({ "content": [
            { "type": "text", "text": "60" },
            { "type": "image", "data": "..." },
            { "type": "text", "text": "done" }
        ]});
        assert_eq!(text_parts(&value, "content").as_deref(), Some("60\ndone"));
        assert_eq!(text_parts(&json!({ "content": [] }), "content"), None);
    }
}
