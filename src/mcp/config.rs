use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to launch an MCP server that speaks JSON-RPC over its stdin/stdout.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StdioServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the child. Values may reference `${VAR}`.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl StdioServerConfig {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Expand "${VAR}" placeholders from the process environment.
/// Unknown placeholders are left as-is.
pub fn expand_env_placeholders(input: &str) -> String {
    let mut out = input.to_string();
    for (k, v) in std::env::vars() {
        let needle = format!("${{{k}}}");
        if out.contains(&needle) {
            out = out.replace(&needle, &v);
        }
    }
    out
}

pub fn expand_env_map(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), expand_env_placeholders(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_placeholder_is_kept() {
        assert_eq!(
            expand_env_placeholders("${POKE_MCP_SURELY_UNSET_VAR}/x"),
            "${POKE_MCP_SURELY_UNSET_VAR}/x"
        );
    }

    #[test]
    fn test_builder() {
        let cfg = StdioServerConfig::new("pokedex-server")
            .arg("--verbose")
            .env("RUST_LOG", "debug");
        assert_eq!(cfg.args, vec!["--verbose"]);
        assert_eq!(cfg.env.get("RUST_LOG").map(String::as_str), Some("debug"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let cfg: StdioServerConfig = serde_json::from_str(r#"{ "command": "math-server" }"#).unwrap();
        assert_eq!(cfg, StdioServerConfig::new("math-server"));
    }
}
