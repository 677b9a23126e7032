//! Resource errors raised while resolving `poke://` locators.

use std::fmt;

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Which upstream collection a lookup targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `/pokemon/{id_or_name}`
    Pokemon,
    /// `/type/{type_name}`
    Type,
}

impl ResourceKind {
    fn not_found_label(self) -> &'static str {
        match self {
            Self::Pokemon => "Pokémon with ID/name",
            Self::Type => "Type",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pokemon => f.write_str("Pokémon"),
            Self::Type => f.write_str("type"),
        }
    }
}

/// A resource could not be produced.
///
/// Every variant is surfaced to the MCP caller as a "resource unavailable"
/// error response carrying the `Display` text. Nothing is retried.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Upstream answered 404.
    #[error("{} '{}' not found", .kind.not_found_label(), .identifier)]
    NotFound {
        kind: ResourceKind,
        identifier: String,
    },

    /// Upstream answered with any other non-200 status.
    #[error("PokeAPI error: HTTP {status}")]
    Upstream { status: u16 },

    /// The request never produced a response (timeout, DNS, refused, ...).
    #[error("Failed to fetch {kind} data: {source}")]
    FetchFailed {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON shape we consume.
    #[error("Error processing {kind} data: {source}")]
    Processing {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },

    /// The locator does not match any registered resource.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

impl ResourceError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ResourceError> for McpError {
    fn from(err: ResourceError) -> Self {
        let message = err.to_string();
        match err {
            ResourceError::NotFound { .. } => McpError::resource_not_found(message, None),
            ResourceError::UnknownResource(_) => McpError::invalid_params(message, None),
            ResourceError::Upstream { .. }
            | ResourceError::FetchFailed { .. }
            | ResourceError::Processing { .. } => McpError::internal_error(message, None),
        }
    }
}
