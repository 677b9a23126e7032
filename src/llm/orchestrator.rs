//! LLM orchestrator with tool loop execution.
//!
//! The orchestrator manages the complete lifecycle of an agent run:
//! 1. Send the conversation and tool catalog to the LLM
//! 2. Stream the response, detecting tool calls
//! 3. Execute tool calls via the MCP session
//! 4. Feed tool results back to the LLM
//! 5. Repeat until the model produces a final response, or the iteration
//!    limit is reached
//!
//! # Example
//!
//! ```rust,ignore
//! let session = Arc::new(ToolSession::connect(&config.server).await?);
//! let orchestrator = Orchestrator::new(settings, Arc::clone(&session));
//! let answer = orchestrator.answer("What is 54 + 2 * 3?").await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::mcp::ToolSession;
use crate::normalized::NormalizedEvent;

use super::{
    ChatCompletionsDriver, LlmDriver, LlmRequest, LlmSettings, Message, ToolCall, ToolCallFunction,
};

/// Accumulated state for a streaming tool call.
#[derive(Debug, Default, Clone)]
struct ToolCallAccumulator {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// LLM orchestrator with tool loop execution.
///
/// The orchestrator wraps an [`LlmDriver`] and adds:
/// - Tool call detection and accumulation
/// - Tool execution via MCP
/// - Automatic tool result feeding
/// - Request ID tracking
#[derive(Clone)]
pub struct Orchestrator {
    settings: LlmSettings,
    tools: Arc<ToolSession>,
    driver: Arc<dyn LlmDriver>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator that talks to the Chat Completions API.
    pub fn new(settings: LlmSettings, tools: Arc<ToolSession>) -> Self {
        let driver = Arc::new(ChatCompletionsDriver::new(settings.clone()));
        Self::with_driver(settings, tools, driver)
    }

    /// Create an orchestrator over an arbitrary driver.
    pub fn with_driver(
        settings: LlmSettings,
        tools: Arc<ToolSession>,
        driver: Arc<dyn LlmDriver>,
    ) -> Self {
        Self {
            settings,
            tools,
            driver,
        }
    }

    /// Run the agent on one user message and return its final answer.
    ///
    /// Only text produced after the last tool result counts as the answer.
    pub async fn answer(&self, user_message: &str) -> anyhow::Result<String> {
        let stream = self.chat(user_message);
        futures::pin_mut!(stream);

        let mut answer = String::new();
        while let Some(event) = stream.next().await {
            match event {
                NormalizedEvent::MessageDelta { text } => answer.push_str(&text),
                NormalizedEvent::ToolResult { .. } => answer.clear(),
                NormalizedEvent::Error { message, code } => match code {
                    Some(code) => anyhow::bail!("agent failed ({code}): {message}"),
                    None => anyhow::bail!("agent failed: {message}"),
                },
                NormalizedEvent::Done => break,
                _ => {}
            }
        }

        Ok(strip_reasoning(&answer).to_string())
    }

    /// Start an agent run with the given user message.
    ///
    /// Returns a stream of [`NormalizedEvent`]s that includes:
    /// - `StreamStart` with a unique request ID
    /// - `MessageDelta` for assistant text
    /// - `ToolCallDelta` and `ToolCallComplete` for tool calls
    /// - `ToolResult` after tool execution
    /// - `Done` or `Error` when complete
    pub fn chat(&self, user_message: &str) -> impl Stream<Item = NormalizedEvent> + Send + use<> {
        self.chat_with_history(vec![Message::user(user_message)])
    }

    /// Start an agent run with existing message history.
    #[allow(clippy::too_many_lines)]
    pub fn chat_with_history(
        &self,
        messages: Vec<Message>,
    ) -> impl Stream<Item = NormalizedEvent> + Send + use<> {
        let request_id = Uuid::new_v4().to_string();
        let tools = self.tools.openai_tools_json();
        let max_iterations = self.settings.max_iterations;

        tracing::info!(
            request_id = %request_id,
            message_count = messages.len(),
            tool_count = tools.len(),
            model = %self.settings.model,
            provider = %self.settings.provider,
            "Starting agent run"
        );

        let orchestrator = self.clone();

        async_stream::stream! {
            yield NormalizedEvent::StreamStart {
                request_id: request_id.clone(),
            };

            let mut history = messages;
            let mut iteration = 0;

            loop {
                if iteration >= max_iterations {
                    tracing::error!(
                        request_id = %request_id,
                        iteration = iteration,
                        max_iterations = max_iterations,
                        "Maximum tool loop iterations exceeded"
                    );
                    yield NormalizedEvent::Error {
                        message: "Maximum tool loop iterations exceeded".to_string(),
                        code: Some("MAX_ITERATIONS".to_string()),
                    };
                    break;
                }
                iteration += 1;

                tracing::info!(
                    request_id = %request_id,
                    iteration = iteration,
                    message_count = history.len(),
                    "Starting tool loop iteration"
                );

                let req = LlmRequest {
                    messages: history.clone(),
                    tools: tools.clone(),
                };

                let driver_stream = match orchestrator.driver.stream(req).await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!(
                            request_id = %request_id,
                            iteration = iteration,
                            error = %e,
                            "Failed to create driver stream"
                        );
                        yield NormalizedEvent::Error {
                            message: e.to_string(),
                            code: None,
                        };
                        break;
                    }
                };

                let mut tool_accumulators: BTreeMap<usize, ToolCallAccumulator> = BTreeMap::new();
                let mut assistant_text = String::new();
                let mut has_tool_calls = false;
                let mut finish_reason: Option<String> = None;

                futures::pin_mut!(driver_stream);

                while let Some(result) = driver_stream.next().await {
                    match result {
                        Ok(event) => {
                            match &event {
                                NormalizedEvent::MessageDelta { text } => {
                                    assistant_text.push_str(text);
                                }
                                NormalizedEvent::ToolCallDelta {
                                    call_index,
                                    id,
                                    name,
                                    arguments_delta,
                                } => {
                                    has_tool_calls = true;
                                    let acc = tool_accumulators.entry(*call_index).or_default();
                                    if acc.id.is_none() {
                                        acc.id.clone_from(id);
                                    }
                                    if acc.name.is_none() {
                                        acc.name.clone_from(name);
                                    }
                                    if let Some(delta) = arguments_delta {
                                        acc.arguments.push_str(delta);
                                    }
                                }
                                NormalizedEvent::ToolCallComplete { .. } => {
                                    has_tool_calls = true;
                                    finish_reason = Some("tool_calls".to_string());
                                }
                                NormalizedEvent::Done => {
                                    // Hold Done back while tool calls are pending
                                    if !has_tool_calls {
                                        yield event;
                                        return;
                                    }
                                    continue;
                                }
                                NormalizedEvent::Error { .. } => {
                                    yield event;
                                    return;
                                }
                                _ => {}
                            }
                            yield event;
                        }
                        Err(e) => {
                            yield NormalizedEvent::Error {
                                message: e.to_string(),
                                code: None,
                            };
                            return;
                        }
                    }
                }

                if !has_tool_calls || finish_reason.as_deref() != Some("tool_calls") {
                    tracing::info!(
                        request_id = %request_id,
                        iteration = iteration,
                        has_tool_calls = has_tool_calls,
                        finish_reason = ?finish_reason,
                        "No tool calls to process, completing run"
                    );
                    yield NormalizedEvent::Done;
                    break;
                }

                let tool_calls: Vec<ToolCall> = tool_accumulators
                    .values()
                    .filter_map(|acc| {
                        Some(ToolCall {
                            id: acc.id.clone()?,
                            call_type: "function".to_string(),
                            function: ToolCallFunction {
                                name: acc.name.clone()?,
                                arguments: acc.arguments.clone(),
                            },
                        })
                    })
                    .collect();

                if tool_calls.is_empty() {
                    tracing::warn!(
                        request_id = %request_id,
                        iteration = iteration,
                        "No valid tool calls built from accumulators"
                    );
                    yield NormalizedEvent::Done;
                    break;
                }

                history.push(Message::assistant_tool_calls(
                    (!assistant_text.is_empty()).then(|| assistant_text.clone()),
                    tool_calls.clone(),
                ));

                for tool_call in &tool_calls {
                    let tool_name = &tool_call.function.name;

                    tracing::info!(
                        request_id = %request_id,
                        iteration = iteration,
                        tool_id = %tool_call.id,
                        tool_name = %tool_name,
                        arguments = %tool_call.function.arguments,
                        "Executing tool call"
                    );

                    let outcome = match parse_arguments(&tool_call.function.arguments) {
                        Ok(arguments) => orchestrator.tools.call_tool(tool_name, arguments).await,
                        Err(e) => Err(e),
                    };

                    let (content, success) = match outcome {
                        Ok(content) => {
                            tracing::info!(
                                request_id = %request_id,
                                tool_id = %tool_call.id,
                                tool_name = %tool_name,
                                result = %content,
                                "Tool call succeeded"
                            );
                            (content, true)
                        }
                        Err(e) => {
                            tracing::error!(
                                request_id = %request_id,
                                tool_id = %tool_call.id,
                                tool_name = %tool_name,
                                error = %e,
                                "Tool call failed"
                            );
                            (format!("Error: {e}"), false)
                        }
                    };

                    yield NormalizedEvent::ToolResult {
                        id: tool_call.id.clone(),
                        name: tool_name.clone(),
                        content: content.clone(),
                        success,
                    };

                    history.push(Message::tool_result(tool_call.id.clone(), content));
                }
            }
        }
    }
}

/// Decode streamed tool-call arguments. An empty string means no arguments.
fn parse_arguments(raw: &str) -> anyhow::Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("invalid arguments JSON: {e}"))
}

/// Drop a leading `<think>…</think>` block emitted by reasoning models.
#[must_use]
pub fn strip_reasoning(text: &str) -> &str {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim();
        }
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"a":2}"#).unwrap()["a"], 2);
        assert_eq!(parse_arguments("  ").unwrap(), serde_json::json!({}));

        let err = parse_arguments(r#"{"a":2"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid arguments JSON:"));
    }

    #[test]
    fn test_strip_reasoning() {
        assert_eq!(strip_reasoning("<think>\n54 + 6\n</think>\n\n60"), "60");
        assert_eq!(strip_reasoning("  The answer is 60. "), "The answer is 60.");
        assert_eq!(strip_reasoning("<think>unterminated"), "<think>unterminated");
    }
}
