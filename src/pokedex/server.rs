//! MCP surface of the Pokédex: resource listing, templates and reads.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        AnnotateAble, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParam, RawResource, RawResourceTemplate, ReadResourceRequestParam,
        ReadResourceResult, Resource, ResourceContents, ResourceTemplate, ServerCapabilities,
        ServerInfo,
    },
    service::RequestContext,
};
use tracing::{info, warn};

use super::Pokedex;
use super::resources::{POKEMON_TEMPLATE, STARTERS_URI, TYPES_TEMPLATE};

pub const SERVER_NAME: &str = "mini-pokedex-lite";

const JSON_MIME: &str = "application/json";

/// Locators announced on stderr at startup.
pub const EXAMPLE_LOCATORS: [&str; 4] = [
    STARTERS_URI,
    "poke://pokemon/1",
    "poke://pokemon/pikachu",
    "poke://types/fire",
];

/// Human-readable startup notice written to stderr regardless of the log
/// filter.
#[must_use]
pub fn startup_banner(upstream: &str) -> String {
    let mut banner = format!(
        "{SERVER_NAME} v{} serving poke:// resources over stdio (upstream: {upstream})\nTry:",
        env!("CARGO_PKG_VERSION")
    );
    for uri in EXAMPLE_LOCATORS {
        banner.push_str("\n  ");
        banner.push_str(uri);
    }
    banner
}

/// MCP server handler over an immutable [`Pokedex`].
#[derive(Debug, Clone)]
pub struct PokedexServer {
    pokedex: Pokedex,
}

impl PokedexServer {
    #[must_use]
    pub fn new(pokedex: Pokedex) -> Self {
        Self { pokedex }
    }

    /// Concrete resources: the starter listing plus each starter's record.
    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        let mut out = vec![json_resource(
            STARTERS_URI,
            "starters",
            "List all starter Pokémon available in this demo.",
        )];

        for starter in self.pokedex.starters().listing().starters {
            out.push(json_resource(
                &starter.uri,
                &starter.name.to_lowercase(),
                &format!("{} (starter #{})", starter.name, starter.id),
            ));
        }
        out
    }

    /// Parameterized resources.
    #[must_use]
    pub fn resource_templates() -> Vec<ResourceTemplate> {
        vec![
            json_template(
                POKEMON_TEMPLATE,
                "pokemon",
                "Get detailed Pokémon information by ID or name.",
            ),
            json_template(
                TYPES_TEMPLATE,
                "pokemon_by_type",
                "Get the first Pokémon of a specific type.",
            ),
        ]
    }
}

fn json_resource(uri: &str, name: &str, description: &str) -> Resource {
    let mut raw = RawResource::new(uri, name);
    raw.description = Some(description.to_string());
    raw.mime_type = Some(JSON_MIME.to_string());
    raw.no_annotation()
}

fn json_template(uri_template: &str, name: &str, description: &str) -> ResourceTemplate {
    RawResourceTemplate {
        uri_template: uri_template.to_string(),
        name: name.to_string(),
        title: None,
        description: Some(description.to_string()),
        mime_type: Some(JSON_MIME.to_string()),
    }
    .no_annotation()
}

impl ServerHandler for PokedexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_resources().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Read-only Pokédex. Read poke://starters, poke://pokemon/{id_or_name} \
                 or poke://types/{type_name}."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(self.resources()))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult::with_all_items(
            Self::resource_templates(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri;
        info!(%uri, "Reading resource");

        match self.pokedex.read(&uri).await {
            Ok(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, uri)],
            }),
            Err(err) => {
                warn!(%uri, error = %err, "Resource unavailable");
                Err(err.into())
            }
        }
    }
}
