//! Shared fixtures: a fake PokéAPI and a scripted LLM driver.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use poke_mcp::llm::{EventStream, LlmDriver, LlmRequest, LlmSettings, Message, Provider};
use poke_mcp::normalized::NormalizedEvent;
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// Fake PokéAPI
// ─────────────────────────────────────────────────────────────────────────────

pub fn bulbasaur() -> serde_json::Value {
    json!({
        "id": 1,
        "name": "bulbasaur",
        "height": 7,
        "weight": 69,
        "types": [
            { "slot": 1, "type": { "name": "grass", "url": "https://pokeapi.co/api/v2/type/12/" } },
            { "slot": 2, "type": { "name": "poison", "url": "https://pokeapi.co/api/v2/type/4/" } }
        ],
        "abilities": [
            { "ability": { "name": "overgrow", "url": "" }, "is_hidden": false, "slot": 1 },
            { "ability": { "name": "chlorophyll", "url": "" }, "is_hidden": true, "slot": 3 }
        ],
        "stats": [
            { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "defense", "url": "" } },
            { "base_stat": 45, "effort": 0, "stat": { "name": "speed", "url": "" } }
        ],
        "sprites": {
            "front_default": "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/1.png",
            "back_default": null
        }
    })
}

/// Upstream member names of the fake `fire` type, in upstream order.
pub fn fire_members() -> Vec<String> {
    [
        "charmander", "charmeleon", "charizard", "vulpix", "ninetales", "growlithe",
        "arcanine", "ponyta", "rapidash", "magmar", "flareon", "moltres",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

async fn pokemon(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "1" | "bulbasaur" => Json(bulbasaur()).into_response(),
        "mr mime" => {
            let mut body = bulbasaur();
            body["id"] = json!(122);
            body["name"] = json!("mr-mime");
            Json(body).into_response()
        }
        "teapot" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "incomplete" => Json(json!({ "id": 0, "name": "missingno", "height": 10 })).into_response(),
        "html" => "<html>maintenance</html>".into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(bulbasaur()).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

async fn pokemon_type(Path(name): Path<String>) -> Response {
    let members = match name.as_str() {
        "fire" => fire_members(),
        "shadow" => vec!["lugia".to_string(), "ho-oh".to_string()],
        _ => return (StatusCode::NOT_FOUND, "Not Found").into_response(),
    };
    let id = if name == "fire" { 10 } else { 10002 };
    let pokemon: Vec<_> = members
        .iter()
        .map(|m| json!({ "slot": 1, "pokemon": { "name": m, "url": "" } }))
        .collect();
    Json(json!({ "id": id, "name": name, "pokemon": pokemon })).into_response()
}

/// Serve the fake PokéAPI on an ephemeral port and return its base URL.
pub async fn spawn_fake_pokeapi() -> String {
    let app = Router::new()
        .route("/pokemon/{id}", get(pokemon))
        .route("/type/{name}", get(pokemon_type));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted LLM driver
// ─────────────────────────────────────────────────────────────────────────────

/// Replays canned turns and records every request it receives.
#[derive(Default)]
pub struct ScriptedDriver {
    turns: Mutex<VecDeque<Vec<NormalizedEvent>>>,
    repeat_last: bool,
    pub requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedDriver {
    pub fn new(turns: Vec<Vec<NormalizedEvent>>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            ..Self::default()
        })
    }

    /// Keep replaying the final turn forever.
    pub fn repeating(turn: Vec<NormalizedEvent>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(VecDeque::from([turn])),
            repeat_last: true,
            ..Self::default()
        })
    }

    pub fn recorded(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmDriver for ScriptedDriver {
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
        self.requests.lock().unwrap().push(req.messages);

        let mut turns = self.turns.lock().unwrap();
        let events = if self.repeat_last && turns.len() == 1 {
            turns.front().cloned()
        } else {
            turns.pop_front()
        }
        .ok_or_else(|| anyhow::anyhow!("script exhausted"))?;

        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

/// One assistant turn that calls `name` with `arguments`.
pub fn tool_call_turn(id: &str, name: &str, arguments: &str) -> Vec<NormalizedEvent> {
    vec![
        NormalizedEvent::ToolCallDelta {
            call_index: 0,
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            arguments_delta: Some(arguments.to_string()),
        },
        NormalizedEvent::ToolCallComplete {
            call_index: 0,
            id: id.to_string(),
            name: name.to_string(),
            arguments_json: arguments.to_string(),
        },
        NormalizedEvent::Done,
    ]
}

/// One assistant turn that answers with `text`.
pub fn text_turn(text: &str) -> Vec<NormalizedEvent> {
    vec![
        NormalizedEvent::MessageDelta {
            text: text.to_string(),
        },
        NormalizedEvent::Done,
    ]
}

pub fn settings(max_iterations: usize) -> LlmSettings {
    LlmSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key: Some("test-key".to_string()),
        model: "scripted".to_string(),
        provider: Provider::Generic,
        temperature: Some(0.0),
        max_iterations,
    }
}
