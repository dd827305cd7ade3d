//! Wire DTOs for the tournament backend.
//!
//! Field names mirror the backend's snake_case JSON. Discord snowflakes
//! travel as strings end to end; they are only parsed into numeric ids at
//! the Discord boundary.

use serde::{Deserialize, Serialize};

/// A player identity: one Pokemon Showdown account, optionally linked to a
/// Discord account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    /// Canonical (normalized) Showdown username.
    pub ps_user: String,
    #[serde(default)]
    pub discord_user: Option<String>,
    #[serde(default)]
    pub discord_id: Option<String>,
}

/// Payload for creating a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub ps_user: String,
    pub discord_user: String,
    pub discord_id: String,
}

/// Payload for linking a Discord identity to an existing player.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerLink {
    pub ps_user: String,
    pub discord_user: String,
    pub discord_id: String,
}

/// A known non-canonical spelling of a player's handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAlias {
    pub id: i64,
    pub player_id: i64,
    pub alias: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPlayerAlias {
    pub player_id: i64,
    pub alias: String,
}

/// A tournament and the Discord channels/roles it is wired to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub format: String,
    /// Channel where `/in` and `/out` are accepted.
    #[serde(default)]
    pub signup_snowflake: Option<String>,
    /// Channel where admin commands are accepted.
    #[serde(default)]
    pub admin_snowflake: Option<String>,
    /// Category containing the scheduling thread pools.
    #[serde(default)]
    pub thread_category_snowflake: Option<String>,
    /// Channel where result embeds are posted.
    #[serde(default)]
    pub result_snowflake: Option<String>,
    /// Role granted to entrants.
    #[serde(default)]
    pub role_snowflake: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTournament {
    pub name: String,
    pub season: i64,
    pub format: String,
    pub start_date: String,
    pub finish_date: Option<String>,
    pub team_tour: bool,
    pub info: Option<String>,
    pub winner_first_to: i64,
    pub elimination: i64,
    pub signup_start_date: Option<String>,
    pub signup_finish_date: Option<String>,
}

/// One round within a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: i64,
    pub round_number: i64,
    #[serde(default)]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRound {
    pub tournament_slug: String,
    pub round_number: i64,
    pub deadline: Option<String>,
}

/// A player's registration within one tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: i64,
    pub player: Player,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEntrant {
    pub player_id: i64,
    pub tournament_slug: String,
}

/// A scheduled or completed match between two entrants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub id: i64,
    pub entrant1: Entrant,
    pub entrant2: Entrant,
    /// Entrant id of the winner, once reported.
    #[serde(default)]
    pub winner_id: Option<i64>,
}

impl Pairing {
    pub fn has_result(&self) -> bool {
        self.winner_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPairing {
    pub round_id: i64,
    pub entrant1_id: i64,
    pub entrant2_id: i64,
}

/// An uploaded replay link for one game of a pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub id: i64,
    pub pairing_id: i64,
    pub url: String,
    pub match_number: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReplay {
    pub pairing_id: i64,
    pub url: String,
    pub match_number: i64,
}

/// An automatic win for an entrant with no opponent this round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundBye {
    pub id: i64,
    pub round_id: i64,
    pub entrant_player_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRoundBye {
    pub round_id: i64,
    pub entrant_player_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn player_tolerates_missing_discord_fields() {
        let player: Player = serde_json::from_str(r#"{"id":7,"ps_user":"bigpuffa"}"#)
            .expect("player without discord fields should parse");
        assert_eq!(player.discord_user, None);
        assert_eq!(player.discord_id, None);
    }

    #[test]
    fn pairing_parses_nested_entrants() {
        let json = r#"{
            "id": 3,
            "entrant1": {"id": 1, "player": {"id": 10, "ps_user": "alpha", "discord_id": "111"}},
            "entrant2": {"id": 2, "player": {"id": 11, "ps_user": "beta"}},
            "winner_id": 1
        }"#;
        let pairing: Pairing = serde_json::from_str(json).expect("pairing should parse");
        assert!(pairing.has_result());
        assert_eq!(pairing.entrant1.player.ps_user, "alpha");
        assert_eq!(pairing.entrant2.player.discord_id, None);
    }
}
