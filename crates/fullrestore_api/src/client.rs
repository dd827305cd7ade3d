//! REST client for the tournament backend.
//!
//! Thin request/response wrapper: each method issues one HTTP call and maps
//! the status code into the `ApiError` taxonomy. No retries; failures are
//! handled case by case at the call site.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Entrant, NewEntrant, NewPairing, NewPlayer, NewPlayerAlias, NewReplay, NewRound, NewRoundBye,
    NewTournament, Pairing, Player, PlayerAlias, PlayerLink, Replay, Round, RoundBye, Tournament,
};

/// Map a non-success status onto the error taxonomy.
///
/// 404 and 409 are expected control-flow signals; anything else carries the
/// response body for the admin-channel diagnostic.
pub(crate) fn status_error(status: StatusCode, resource: &'static str, body: String) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { resource },
        StatusCode::CONFLICT => ApiError::Conflict { resource },
        other => ApiError::Status {
            status: other.as_u16(),
            body,
        },
    }
}

/// Typed client over the backend's resource endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl ApiClient {
    /// Build a client with the credentials from `config` as default headers.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidHeader {
                    header: "authorization",
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| ApiError::InvalidHeader { header: "x-api-key" })?;
            value.set_sensitive(true);
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    // ----- players -----

    /// Create a player record. Fails with `Conflict` when the canonical
    /// handle is already taken.
    pub async fn create_player(&self, player: &NewPlayer) -> ApiResult<Player> {
        self.post(&self.config.players_endpoint, "player", player)
            .await
    }

    pub async fn find_player_by_discord_id(&self, discord_id: &str) -> ApiResult<Player> {
        self.get_one(
            &self.config.players_endpoint,
            "player",
            &[("discord_id", discord_id)],
        )
        .await
    }

    pub async fn find_player_by_handle(&self, handle: &str) -> ApiResult<Player> {
        self.get_one(
            &self.config.players_endpoint,
            "player",
            &[("ps_user", handle)],
        )
        .await
    }

    /// Attach a Discord identity to an existing player record.
    pub async fn link_discord_to_player(
        &self,
        player_id: i64,
        link: &PlayerLink,
    ) -> ApiResult<Player> {
        let url = format!(
            "{}/{player_id}",
            self.config.url(&self.config.players_endpoint)
        );
        let response = self.http.put(url).json(link).send().await?;
        decode(response, "player").await
    }

    pub async fn create_alias(&self, alias: &NewPlayerAlias) -> ApiResult<PlayerAlias> {
        self.post(&self.config.player_aliases_endpoint, "player alias", alias)
            .await
    }

    /// Check whether a raw handle is already known as an alias.
    pub async fn find_alias(&self, alias: &str) -> ApiResult<PlayerAlias> {
        self.get_one(
            &self.config.player_aliases_endpoint,
            "player alias",
            &[("alias", alias)],
        )
        .await
    }

    // ----- tournaments -----

    pub async fn create_tournament(&self, tournament: &NewTournament) -> ApiResult<Tournament> {
        self.post(&self.config.tournaments_endpoint, "tournament", tournament)
            .await
    }

    pub async fn find_tournament_by_signup_channel(
        &self,
        channel_id: &str,
    ) -> ApiResult<Tournament> {
        self.get_one(
            &self.config.tournaments_endpoint,
            "tournament",
            &[("signup_snowflake", channel_id)],
        )
        .await
    }

    pub async fn find_tournament_by_admin_channel(
        &self,
        channel_id: &str,
    ) -> ApiResult<Tournament> {
        self.get_one(
            &self.config.tournaments_endpoint,
            "tournament",
            &[("admin_snowflake", channel_id)],
        )
        .await
    }

    pub async fn find_tournament_by_thread_category(
        &self,
        category_id: &str,
    ) -> ApiResult<Tournament> {
        self.get_one(
            &self.config.tournaments_endpoint,
            "tournament",
            &[("thread_category_snowflake", category_id)],
        )
        .await
    }

    // ----- rounds -----

    pub async fn create_round(&self, round: &NewRound) -> ApiResult<Round> {
        self.post(&self.config.rounds_endpoint, "round", round).await
    }

    pub async fn find_round(&self, tournament_slug: &str, round_number: i64) -> ApiResult<Round> {
        self.get_one(
            &self.config.rounds_endpoint,
            "round",
            &[
                ("tournament_slug", tournament_slug),
                ("round", &round_number.to_string()),
            ],
        )
        .await
    }

    // ----- entrants -----

    /// Register a player for a tournament. Fails with `Conflict` when they
    /// are already signed up.
    pub async fn create_entrant(&self, entrant: &NewEntrant) -> ApiResult<Entrant> {
        self.post(&self.config.entrant_players_endpoint, "entrant", entrant)
            .await
    }

    pub async fn find_entrant(&self, tournament_slug: &str, discord_id: &str) -> ApiResult<Entrant> {
        self.get_one(
            &self.config.entrant_players_endpoint,
            "entrant",
            &[
                ("tournament_slug", tournament_slug),
                ("discord_id", discord_id),
            ],
        )
        .await
    }

    pub async fn list_entrants(&self, tournament_slug: &str) -> ApiResult<Vec<Entrant>> {
        let url = format!(
            "{}/{tournament_slug}/entrants",
            self.config.url(&self.config.tournaments_endpoint)
        );
        let response = self.http.get(url).send().await?;
        decode(response, "entrants").await
    }

    pub async fn delete_entrant(&self, player_id: i64, tournament_slug: &str) -> ApiResult<()> {
        let url = self.config.url(&self.config.entrant_players_endpoint);
        let response = self
            .http
            .delete(url)
            .query(&[
                ("player_id", player_id.to_string().as_str()),
                ("tournament_slug", tournament_slug),
            ])
            .send()
            .await?;
        expect_success(response, "entrant").await
    }

    // ----- pairings -----

    pub async fn create_pairing(&self, pairing: &NewPairing) -> ApiResult<Pairing> {
        self.post(&self.config.pairings_endpoint, "pairing", pairing)
            .await
    }

    /// Find the pairing a player is part of within one round.
    pub async fn find_pairing(&self, round_id: i64, discord_id: &str) -> ApiResult<Pairing> {
        self.get_one(
            &self.config.pairings_endpoint,
            "pairing",
            &[
                ("round_id", round_id.to_string().as_str()),
                ("discord_id", discord_id),
            ],
        )
        .await
    }

    /// All pairings a player has in a tournament, across rounds. Used to
    /// decide whether the tournament has started for them.
    pub async fn list_pairings_for_player(
        &self,
        tournament_slug: &str,
        discord_id: &str,
    ) -> ApiResult<Vec<Pairing>> {
        self.get_list(
            &self.config.pairings_endpoint,
            &[
                ("tournament_slug", tournament_slug),
                ("discord_id", discord_id),
            ],
        )
        .await
    }

    pub async fn delete_pairing(&self, pairing_id: i64) -> ApiResult<()> {
        let url = format!(
            "{}/{pairing_id}",
            self.config.url(&self.config.pairings_endpoint)
        );
        let response = self.http.delete(url).send().await?;
        expect_success(response, "pairing").await
    }

    /// Record (or, with `None`, clear) the winner of a pairing.
    pub async fn report_winner(
        &self,
        pairing_id: i64,
        winner_entrant_id: Option<i64>,
    ) -> ApiResult<Pairing> {
        let url = format!(
            "{}/{pairing_id}",
            self.config.url(&self.config.pairings_endpoint)
        );
        let body = serde_json::json!({ "winner_id": winner_entrant_id });
        let response = self.http.put(url).json(&body).send().await?;
        decode(response, "pairing").await
    }

    // ----- byes -----

    pub async fn create_bye(&self, bye: &NewRoundBye) -> ApiResult<RoundBye> {
        self.post(&self.config.round_byes_endpoint, "bye", bye).await
    }

    pub async fn find_bye(&self, round_id: i64, entrant_player_id: i64) -> ApiResult<RoundBye> {
        self.get_one(
            &self.config.round_byes_endpoint,
            "bye",
            &[
                ("round_id", round_id.to_string().as_str()),
                ("entrant_player_id", entrant_player_id.to_string().as_str()),
            ],
        )
        .await
    }

    pub async fn delete_bye(&self, bye_id: i64) -> ApiResult<()> {
        let url = format!(
            "{}/{bye_id}",
            self.config.url(&self.config.round_byes_endpoint)
        );
        let response = self.http.delete(url).send().await?;
        expect_success(response, "bye").await
    }

    // ----- replays -----

    pub async fn create_replay(&self, replay: &NewReplay) -> ApiResult<Replay> {
        self.post(&self.config.replays_endpoint, "replay", replay)
            .await
    }

    // ----- request plumbing -----

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resource: &'static str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.config.url(endpoint);
        tracing::debug!(resource, %url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        decode(response, resource).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<Vec<T>> {
        let url = self.config.url(endpoint);
        let response = self.http.get(url).query(query).send().await?;
        decode(response, "list").await
    }

    /// Filter lookup that expects exactly one match. An empty result list is
    /// reported as `NotFound`, same as a backend 404.
    async fn get_one<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resource: &'static str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self.config.url(endpoint);
        tracing::debug!(resource, %url, ?query, "GET");
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, resource, body));
        }
        let items: Vec<T> = response.json().await?;
        items
            .into_iter()
            .next()
            .ok_or(ApiError::NotFound { resource })
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    resource: &'static str,
) -> ApiResult<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, resource, body))
    }
}

async fn expect_success(response: reqwest::Response, resource: &'static str) -> ApiResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, resource, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_conflict_are_control_flow() {
        let err = status_error(StatusCode::NOT_FOUND, "player", String::new());
        assert!(err.is_not_found());
        assert!(!err.is_conflict());

        let err = status_error(StatusCode::CONFLICT, "entrant", String::new());
        assert!(err.is_conflict());
    }

    #[test]
    fn other_statuses_carry_the_body() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "pairing",
            "boom".to_string(),
        );
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }
}
