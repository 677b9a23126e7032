//! Mini Pokédex: read-only MCP resources proxying the public PokéAPI.
//!
//! # Resources
//!
//! - `poke://starters`: the fixed starter table (no I/O)
//! - `poke://pokemon/{id_or_name}`: one Pokémon by id or name
//! - `poke://types/{type_name}`: the first members of a type
//!
//! [`Pokedex`] resolves locators to JSON records; [`PokedexServer`] exposes it
//! over MCP.

pub mod client;
pub mod error;
pub mod model;
pub mod resources;
pub mod server;

pub use client::PokeApi;
pub use error::{ResourceError, ResourceKind};
pub use model::{PokemonRecord, StarterEntry, StarterListing, TypeMember, TypePokemonSummary};
pub use resources::{PokeResource, StarterTable};
pub use server::PokedexServer;

use crate::config::PokedexConfig;

/// Immutable resolver shared by every request.
#[derive(Debug, Clone)]
pub struct Pokedex {
    starters: StarterTable,
    api: PokeApi,
}

impl Pokedex {
    #[must_use]
    pub fn new(starters: StarterTable, api: PokeApi) -> Self {
        Self { starters, api }
    }

    pub fn from_config(config: &PokedexConfig) -> anyhow::Result<Self> {
        Ok(Self::new(StarterTable::default(), PokeApi::new(config)?))
    }

    #[must_use]
    pub fn starters(&self) -> &StarterTable {
        &self.starters
    }

    #[must_use]
    pub fn api(&self) -> &PokeApi {
        &self.api
    }

    /// Resolve a locator and render the record as pretty-printed JSON.
    pub async fn read(&self, uri: &str) -> Result<String, ResourceError> {
        match uri.parse::<PokeResource>()? {
            PokeResource::Starters => Ok(render(&self.starters.listing())),
            PokeResource::Pokemon(id) => self.api.pokemon(&id).await.map(|r| render(&r)),
            PokeResource::Type(name) => self.api.pokemon_by_type(&name).await.map(|s| render(&s)),
        }
    }
}

fn render<T: serde::Serialize>(value: &T) -> String {
    // Records are plain structs of strings, numbers and string-keyed maps,
    // which always serialize.
    serde_json::to_string_pretty(value).unwrap_or_default()
}
