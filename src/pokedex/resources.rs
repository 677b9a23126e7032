//! `poke://` locators and the static starter table.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use super::error::ResourceError;
use super::model::{StarterEntry, StarterListing, capitalize};

pub const SCHEME: &str = "poke://";

pub const STARTERS_URI: &str = "poke://starters";
pub const POKEMON_TEMPLATE: &str = "poke://pokemon/{id_or_name}";
pub const TYPES_TEMPLATE: &str = "poke://types/{type_name}";

/// Characters escaped when a parameter is written back into a locator.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A parsed resource locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PokeResource {
    /// `poke://starters`
    Starters,
    /// `poke://pokemon/{id_or_name}`
    Pokemon(String),
    /// `poke://types/{type_name}`
    Type(String),
}

impl PokeResource {
    #[must_use]
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PokeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starters => f.write_str(STARTERS_URI),
            Self::Pokemon(id) => write!(f, "{SCHEME}pokemon/{}", utf8_percent_encode(id, SEGMENT)),
            Self::Type(name) => write!(f, "{SCHEME}types/{}", utf8_percent_encode(name, SEGMENT)),
        }
    }
}

impl FromStr for PokeResource {
    type Err = ResourceError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let unknown = || ResourceError::UnknownResource(uri.to_string());
        let rest = uri.strip_prefix(SCHEME).ok_or_else(unknown)?;

        if rest == "starters" {
            return Ok(Self::Starters);
        }

        let (collection, raw) = rest.split_once('/').ok_or_else(unknown)?;
        if raw.contains('/') {
            return Err(unknown());
        }
        // Parameters are stored decoded; the upstream client encodes them once.
        let param = percent_decode_str(raw).decode_utf8().ok().ok_or_else(unknown)?;
        if param.is_empty() || param.contains('/') {
            return Err(unknown());
        }

        match collection {
            "pokemon" => Ok(Self::Pokemon(param.into_owned())),
            "types" => Ok(Self::Type(param.into_owned())),
            _ => Err(unknown()),
        }
    }
}

/// Fixed set of starter Pokémon, in display order.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterTable {
    entries: Vec<(String, String)>,
}

impl StarterTable {
    /// Build a table from `(id, upstream name)` pairs.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, name)| (id.into(), name.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payload of `poke://starters`. Pure, never fails.
    #[must_use]
    pub fn listing(&self) -> StarterListing {
        let starters: Vec<StarterEntry> = self
            .entries
            .iter()
            .map(|(id, name)| StarterEntry {
                id: id.clone(),
                name: capitalize(name),
                uri: PokeResource::Pokemon(id.clone()).uri(),
            })
            .collect();

        StarterListing {
            total: starters.len(),
            starters,
        }
    }
}

impl Default for StarterTable {
    fn default() -> Self {
        Self::new([("1", "bulbasaur"), ("4", "charmander"), ("7", "squirtle")])
    }
}
