//! Backend API configuration.
//!
//! Loaded once at startup from environment variables and passed into
//! `ApiClient`. There are no runtime environment variable reads elsewhere
//! in this crate.

use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Connection settings and resource endpoint paths for the tournament
/// backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Absolute base URL, e.g. `https://api.fullrestore.me`.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header.
    pub api_token: Option<String>,
    /// Value for the `x-api-key` header.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,

    pub players_endpoint: String,
    pub player_aliases_endpoint: String,
    pub tournaments_endpoint: String,
    pub rounds_endpoint: String,
    pub round_byes_endpoint: String,
    pub entrant_players_endpoint: String,
    pub pairings_endpoint: String,
    pub replays_endpoint: String,
}

impl ApiConfig {
    /// Load API configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `API_BASEURL` -> base_url (defaults to `http://localhost:3000`)
    /// - `API_TOKEN` -> api_token
    /// - `API_KEY` -> api_key
    /// - `API_TIMEOUT_SECS` -> timeout (defaults to 10 seconds)
    /// - `API_PLAYERS_ENDPOINT`, `API_PLAYER_ALIASES_ENDPOINT`,
    ///   `API_TOURNAMENTS_ENDPOINT`, `API_ROUNDS_ENDPOINT`,
    ///   `API_ROUND_BYES_ENDPOINT`, `API_ENTRANT_PLAYERS_ENDPOINT`,
    ///   `API_PAIRINGS_ENDPOINT`, `API_REPLAYS_ENDPOINT` -> per-resource
    ///   path overrides
    pub fn from_env() -> ApiResult<Self> {
        let base_url =
            std::env::var("API_BASEURL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        if url::Url::parse(&base_url).is_err() {
            return Err(ApiError::InvalidBaseUrl { url: base_url });
        }

        let timeout = std::env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10));

        Ok(Self {
            base_url,
            api_token: std::env::var("API_TOKEN").ok(),
            api_key: std::env::var("API_KEY").ok(),
            timeout,
            players_endpoint: endpoint_from_env("API_PLAYERS_ENDPOINT", "/players"),
            player_aliases_endpoint: endpoint_from_env(
                "API_PLAYER_ALIASES_ENDPOINT",
                "/player-aliases",
            ),
            tournaments_endpoint: endpoint_from_env("API_TOURNAMENTS_ENDPOINT", "/tournaments"),
            rounds_endpoint: endpoint_from_env("API_ROUNDS_ENDPOINT", "/rounds"),
            round_byes_endpoint: endpoint_from_env("API_ROUND_BYES_ENDPOINT", "/round-byes"),
            entrant_players_endpoint: endpoint_from_env(
                "API_ENTRANT_PLAYERS_ENDPOINT",
                "/entrant-players",
            ),
            pairings_endpoint: endpoint_from_env("API_PAIRINGS_ENDPOINT", "/pairings"),
            replays_endpoint: endpoint_from_env("API_REPLAYS_ENDPOINT", "/replays"),
        })
    }

    /// Build a config pointing at `base_url` with default endpoint paths.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            api_key: None,
            timeout: Duration::from_secs(10),
            players_endpoint: "/players".to_string(),
            player_aliases_endpoint: "/player-aliases".to_string(),
            tournaments_endpoint: "/tournaments".to_string(),
            rounds_endpoint: "/rounds".to_string(),
            round_byes_endpoint: "/round-byes".to_string(),
            entrant_players_endpoint: "/entrant-players".to_string(),
            pairings_endpoint: "/pairings".to_string(),
            replays_endpoint: "/replays".to_string(),
        }
    }

    /// Join an endpoint path onto the base URL.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

fn endpoint_from_env(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let config = ApiConfig::for_base_url("http://localhost:3000/");
        assert_eq!(
            config.url("/players"),
            "http://localhost:3000/players".to_string()
        );
        assert_eq!(
            config.url("players"),
            "http://localhost:3000/players".to_string()
        );
    }

    #[test]
    fn default_endpoints_cover_every_resource() {
        let config = ApiConfig::for_base_url("http://localhost:3000");
        assert_eq!(config.players_endpoint, "/players");
        assert_eq!(config.player_aliases_endpoint, "/player-aliases");
        assert_eq!(config.tournaments_endpoint, "/tournaments");
        assert_eq!(config.rounds_endpoint, "/rounds");
        assert_eq!(config.round_byes_endpoint, "/round-byes");
        assert_eq!(config.entrant_players_endpoint, "/entrant-players");
        assert_eq!(config.pairings_endpoint, "/pairings");
        assert_eq!(config.replays_endpoint, "/replays");
    }
}
