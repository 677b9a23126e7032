//! OpenAI Chat Completions API driver.
//!
//! This module implements the [`LlmDriver`] trait for the OpenAI-compatible
//! Chat Completions API (`/v1/chat/completions`), supporting streaming
//! responses and tool calls.

use std::collections::BTreeMap;

use futures::StreamExt;

use crate::normalized::NormalizedEvent;

use super::{EventStream, LlmDriver, LlmRequest, LlmSettings};

/// Accumulated state for a streaming tool call.
#[derive(Default)]
struct ToolAccum {
    id: Option<String>,
    name: Option<String>,
    args: String,
}

/// Turns `chat.completion.chunk` payloads into [`NormalizedEvent`]s.
#[derive(Default)]
struct ChunkDecoder {
    tool_accum: BTreeMap<usize, ToolAccum>,
}

impl ChunkDecoder {
    /// Decode one SSE `data:` payload.
    fn decode(&mut self, data: &str) -> anyhow::Result<Vec<NormalizedEvent>> {
        if data == "[DONE]" {
            return Ok(vec![NormalizedEvent::Done]);
        }

        let v: serde_json::Value = serde_json::from_str(data)?;
        if let Some(err) = v.get("error") {
            return Ok(vec![NormalizedEvent::Error {
                message: err
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("provider error")
                    .to_string(),
                code: err.get("code").and_then(|c| c.as_str()).map(ToString::to_string),
            }]);
        }

        let mut events = Vec::new();
        let choice = &v["choices"][0];
        let delta = &choice["delta"];

        // Assistant text delta
        if let Some(s) = delta.get("content").and_then(|x| x.as_str()) {
            if !s.is_empty() {
                events.push(NormalizedEvent::MessageDelta {
                    text: s.to_string(),
                });
            }
        }

        // Tool calls streaming deltas
        if let Some(arr) = delta.get("tool_calls").and_then(|x| x.as_array()) {
            for tc in arr {
                let idx = tc
                    .get("index")
                    .and_then(serde_json::Value::as_u64)
                    .and_then(|i| usize::try_from(i).ok())
                    .unwrap_or(0);
                let id = tc.get("id").and_then(|x| x.as_str()).map(ToString::to_string);
                let function = tc.get("function");
                let name = function
                    .and_then(|f| f.get("name"))
                    .and_then(|x| x.as_str())
                    .map(ToString::to_string);
                let args_delta = function
                    .and_then(|f| f.get("arguments"))
                    .and_then(|x| x.as_str())
                    .map(ToString::to_string);

                let entry = self.tool_accum.entry(idx).or_default();
                if entry.id.is_none() {
                    entry.id.clone_from(&id);
                }
                if entry.name.is_none() {
                    entry.name.clone_from(&name);
                }
                if let Some(ad) = &args_delta {
                    entry.args.push_str(ad);
                }

                events.push(NormalizedEvent::ToolCallDelta {
                    call_index: idx,
                    id,
                    name,
                    arguments_delta: args_delta,
                });
            }
        }

        // Completion boundary: emit the assembled tool calls
        if choice.get("finish_reason").and_then(|x| x.as_str()) == Some("tool_calls") {
            for (idx, a) in std::mem::take(&mut self.tool_accum) {
                if let (Some(id), Some(name)) = (a.id, a.name) {
                    events.push(NormalizedEvent::ToolCallComplete {
                        call_index: idx,
                        id,
                        name,
                        arguments_json: a.args,
                    });
                }
            }
        }

        Ok(events)
    }
}

/// Driver for the OpenAI-compatible Chat Completions API.
///
/// Connects to `/v1/chat/completions` and streams responses as
/// [`NormalizedEvent`]s.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body(&self, req: LlmRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "stream": true,
            "messages": req.messages,
        });
        if let Some(t) = self.settings.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if !req.tools.is_empty() {
            body["tools"] = serde_json::Value::Array(req.tools);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);
        let body = self.request_body(req);

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("chat completions request failed: HTTP {status}: {detail}");
        }
        let byte_stream = resp.bytes_stream();

        let out = async_stream::try_stream! {
            let mut buf = Vec::<u8>::new();
            let mut decoder = ChunkDecoder::default();

            futures::pin_mut!(byte_stream);
            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk?;
                buf.extend_from_slice(&chunk);

                while let Some((pos, sep_len)) = find_frame_end(&buf) {
                    let frame = buf.drain(..pos + sep_len).collect::<Vec<_>>();
                    let text = String::from_utf8_lossy(&frame);

                    for data in data_lines(&text) {
                        for event in decoder.decode(data)? {
                            yield event;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(out))
    }
}

/// Position and length of the first SSE frame separator (`\n\n` or `\r\n\r\n`).
fn find_frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// `data:` payloads of one SSE frame.
fn data_lines(frame: &str) -> impl Iterator<Item = &str> {
    frame.lines().filter_map(|line| {
        line.trim()
            .strip_prefix("data:")
            .map(str::trim)
            .filter(|d| !d.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, Provider};
    use serde_json::json;

    fn settings() -> LlmSettings {
        LlmSettings {
            base_url: "https://api.groq.com/openai".to_string(),
            api_key: None,
            model: "qwen/qwen3-32b".to_string(),
            provider: Provider::Groq,
            temperature: Some(0.0),
            max_iterations: 10,
        }
    }

    #[test]
    fn test_request_body() {
        let driver = ChatCompletionsDriver::new(settings());
        let body = driver.request_body(LlmRequest {
            messages: vec![Message::user("hi")],
            tools: Vec::new(),
        });

        assert_eq!(body["model"], "qwen/qwen3-32b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_request_body_with_tools() {
        let driver = ChatCompletionsDriver::new(settings());
        let body = driver.request_body(LlmRequest {
            messages: Vec::new(),
            tools: vec![json!({ "type": "function", "function": { "name": "add" } })],
        });
        assert_eq!(body["tools"][0]["function"]["name"], "add");
    }

    #[test]
    fn test_decode_text_delta() {
        let mut decoder = ChunkDecoder::default();
        let events = decoder
            .decode(r#"{"choices":[{"index":0,"delta":{"content":"60"},"finish_reason":null}]}"#)
            .unwrap();
        assert_eq!(
            events,
            vec![NormalizedEvent::MessageDelta {
                text: "60".to_string()
            }]
        );
    }

    #[test]
    fn test_decode_tool_call_fragments() {
        let mut decoder = ChunkDecoder::default();
        decoder
            .decode(r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"multiply","arguments":"{\"a\":2,"}}]}}]}"#)
            .unwrap();
        decoder
            .decode(r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"b\":3}"}}]}}]}"#)
            .unwrap();
        let events = decoder
            .decode(r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#)
            .unwrap();

        assert_eq!(
            events,
            vec![NormalizedEvent::ToolCallComplete {
                call_index: 0,
                id: "call_1".to_string(),
                name: "multiply".to_string(),
                arguments_json: r#"{"a":2,"b":3}"#.to_string(),
            }]
        );
    }

    #[test]
    fn test_decode_done_and_error() {
        let mut decoder = ChunkDecoder::default();
        assert_eq!(decoder.decode("[DONE]").unwrap(), vec![NormalizedEvent::Done]);

        let events = decoder
            .decode(r#"{"error":{"message":"rate limited","code":"rate_limit_exceeded"}}"#)
            .unwrap();
        assert_eq!(
            events,
            vec![NormalizedEvent::Error {
                message: "rate limited".to_string(),
                code: Some("rate_limit_exceeded".to_string()),
            }]
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let mut decoder = ChunkDecoder::default();
        assert!(decoder.decode("{not json").is_err());
    }

    #[test]
    fn test_frame_splitting() {
        assert_eq!(find_frame_end(b"data: a\n\ndata: b"), Some((7, 2)));
        assert_eq!(find_frame_end(b"data: a\r\n\r\n"), Some((7, 4)));
        assert_eq!(find_frame_end(b"data: partial"), None);

        let lines: Vec<_> = data_lines(": keep-alive\ndata: {\"x\":1}\n").collect();
        assert_eq!(lines, vec!["{\"x\":1}"]);
    }
}
