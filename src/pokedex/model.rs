//! Records returned by the `poke://` resources and the upstream payloads they
//! are reshaped from.
//!
//! Upstream structs only declare the keys we consume; a missing key or a value
//! of the wrong type fails deserialization, which the client reports as a
//! processing error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::resources::PokeResource;

// ─────────────────────────────────────────────────────────────────────────────
// Resource records
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed Pokémon record served by `poke://pokemon/{id_or_name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonRecord {
    pub id: u32,
    /// Capitalized display name.
    pub name: String,
    #[serde(rename = "height")]
    pub height_m: f64,
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub base_stats: BTreeMap<String, u32>,
    #[serde(rename = "sprite")]
    pub sprite_url: Option<String>,
    /// Upstream URL the record was built from.
    pub api_url: String,
}

impl PokemonRecord {
    /// Reshape an upstream payload, converting decimetres to metres and
    /// hectograms to kilograms.
    #[must_use]
    pub fn from_upstream(raw: UpstreamPokemon, api_url: String) -> Self {
        Self {
            id: raw.id,
            name: capitalize(&raw.name),
            height_m: f64::from(raw.height) / 10.0,
            weight_kg: f64::from(raw.weight) / 10.0,
            types: raw.types.into_iter().map(|t| t.kind.name).collect(),
            abilities: raw.abilities.into_iter().map(|a| a.ability.name).collect(),
            base_stats: raw
                .stats
                .into_iter()
                .map(|s| (s.stat.name, s.base_stat))
                .collect(),
            sprite_url: raw.sprites.front_default,
            api_url,
        }
    }
}

/// One row of `poke://starters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterEntry {
    pub id: String,
    pub name: String,
    pub uri: String,
}

/// Payload of `poke://starters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterListing {
    pub starters: Vec<StarterEntry>,
    pub total: usize,
}

/// A member of a type listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMember {
    pub name: String,
    pub uri: String,
}

/// Payload of `poke://types/{type_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePokemonSummary {
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_id: u32,
    /// Full upstream member count, even when `pokemon` is truncated.
    pub pokemon_count: usize,
    pub showing: usize,
    pub pokemon: Vec<TypeMember>,
}

impl TypePokemonSummary {
    /// Keep the first `limit` members in upstream order.
    #[must_use]
    pub fn from_upstream(type_name: &str, raw: UpstreamType, limit: usize) -> Self {
        let pokemon_count = raw.pokemon.len();
        let pokemon: Vec<TypeMember> = raw
            .pokemon
            .into_iter()
            .take(limit)
            .map(|slot| TypeMember {
                name: capitalize(&slot.pokemon.name),
                uri: PokeResource::Pokemon(slot.pokemon.name).uri(),
            })
            .collect();

        Self {
            type_name: capitalize(type_name),
            type_id: raw.id,
            pokemon_count,
            showing: pokemon.len(),
            pokemon,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
}

/// `GET /pokemon/{id_or_name}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamPokemon {
    pub id: u32,
    pub name: String,
    /// Decimetres.
    pub height: u32,
    /// Hectograms.
    pub weight: u32,
    pub types: Vec<TypeSlot>,
    pub abilities: Vec<AbilitySlot>,
    pub stats: Vec<StatSlot>,
    pub sprites: Sprites,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeMemberSlot {
    pub pokemon: NamedRef,
}

/// `GET /type/{type_name}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamType {
    pub id: u32,
    pub pokemon: Vec<TypeMemberSlot>,
}

/// Uppercase the first character and lowercase the rest.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
