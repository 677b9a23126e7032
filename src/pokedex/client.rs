//! Thin async client for the upstream PokéAPI.
//!
//! One GET per lookup, bounded by the configured timeout. No retries and no
//! caching: identical lookups against an unchanged upstream produce identical
//! records.

use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::error::{ResourceError, ResourceKind};
use super::model::{PokemonRecord, TypePokemonSummary, UpstreamPokemon, UpstreamType};
use crate::config::PokedexConfig;

/// HTTP client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct PokeApi {
    http: reqwest::Client,
    base_url: Url,
    type_listing_limit: usize,
}

impl PokeApi {
    pub fn new(config: &PokedexConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid PokéAPI base url: {}", config.base_url))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            bail!("PokéAPI base url must be http(s): {base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            type_listing_limit: config.type_listing_limit,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{collection}/{param}` with `param` percent-encoded as a single
    /// path segment.
    fn endpoint(&self, collection: &str, param: &str) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base urls, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(collection).push(param);
        }
        url
    }

    /// Lookup by numeric id or lowercase name.
    pub async fn pokemon(&self, id_or_name: &str) -> Result<PokemonRecord, ResourceError> {
        let url = self.endpoint("pokemon", id_or_name);
        let raw: UpstreamPokemon = self.get_json(ResourceKind::Pokemon, id_or_name, &url).await?;
        Ok(PokemonRecord::from_upstream(raw, url.to_string()))
    }

    /// Members of a type, truncated to the listing limit.
    pub async fn pokemon_by_type(
        &self,
        type_name: &str,
    ) -> Result<TypePokemonSummary, ResourceError> {
        let url = self.endpoint("type", type_name);
        let raw: UpstreamType = self.get_json(ResourceKind::Type, type_name, &url).await?;
        Ok(TypePokemonSummary::from_upstream(
            type_name,
            raw,
            self.type_listing_limit,
        ))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        identifier: &str,
        url: &Url,
    ) -> Result<T, ResourceError> {
        debug!(%url, %kind, "Fetching from PokéAPI");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| {
                warn!(%url, error = %source, "PokéAPI request failed");
                ResourceError::FetchFailed { kind, source }
            })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(ResourceError::NotFound {
                    kind,
                    identifier: identifier.to_string(),
                });
            }
            status => {
                warn!(%url, status = status.as_u16(), "PokéAPI returned an error status");
                return Err(ResourceError::Upstream {
                    status: status.as_u16(),
                });
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ResourceError::FetchFailed { kind, source })?;

        serde_json::from_slice(&body).map_err(|source| ResourceError::Processing { kind, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> anyhow::Result<PokeApi> {
        PokeApi::new(&PokedexConfig {
            base_url: base_url.to_string(),
            ..PokedexConfig::default()
        })
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = api("https://pokeapi.co/api/v2").unwrap();
        assert_eq!(
            api.endpoint("pokemon", "1").as_str(),
            "https://pokeapi.co/api/v2/pokemon/1"
        );

        let api = api_with_slash();
        assert_eq!(
            api.endpoint("type", "fire").as_str(),
            "https://pokeapi.co/api/v2/type/fire"
        );
    }

    fn api_with_slash() -> PokeApi {
        api("https://pokeapi.co/api/v2/").unwrap()
    }

    #[test]
    fn test_endpoint_encodes_param() {
        let api = api("http://localhost:9000").unwrap();
        assert_eq!(
            api.endpoint("pokemon", "mr mime?").as_str(),
            "http://localhost:9000/pokemon/mr%20mime%3F"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(api("mailto:ash@example.com").is_err());
        assert!(api("ftp://pokeapi.co").is_err());
        assert!(api("not a url").is_err());
    }
}
