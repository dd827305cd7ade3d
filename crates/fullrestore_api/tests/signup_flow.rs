//! End-to-end reconciliation scenarios against an in-memory directory.
//!
//! The fake emulates the backend's behavior at the interface level: a
//! uniqueness constraint on the canonical handle (409 on create) and
//! alias-aware handle search, the way the real players endpoint resolves
//! Showdown usernames.

use std::sync::Mutex;

use async_trait::async_trait;
use fullrestore_api::models::{NewPlayer, NewPlayerAlias, Player, PlayerAlias, PlayerLink};
use fullrestore_api::{
    resolve_signup, AliasOutcome, ApiError, ApiResult, PlayerDirectory, SignupOutcome,
    SignupRequest,
};
use pretty_assertions::assert_eq;

/// Showdown-style identity key: the backend compares usernames with
/// case and punctuation stripped.
fn handle_key(handle: &str) -> String {
    handle
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[derive(Default)]
struct State {
    players: Vec<Player>,
    aliases: Vec<PlayerAlias>,
    next_id: i64,
}

#[derive(Default)]
struct FakeDirectory {
    state: Mutex<State>,
}

impl FakeDirectory {
    fn with_player(ps_user: &str, discord_id: Option<&str>) -> Self {
        let directory = FakeDirectory::default();
        {
            let mut state = directory.state.lock().expect("state lock");
            state.next_id = 1;
            state.players.push(Player {
                id: 1,
                ps_user: ps_user.to_string(),
                discord_user: discord_id.map(|_| "original-owner".to_string()),
                discord_id: discord_id.map(str::to_string),
            });
        }
        directory
    }

    fn player_count(&self) -> usize {
        self.state.lock().expect("state lock").players.len()
    }

    fn alias_count(&self) -> usize {
        self.state.lock().expect("state lock").aliases.len()
    }

    fn player(&self, id: i64) -> Player {
        self.state
            .lock()
            .expect("state lock")
            .players
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .expect("player should exist")
    }
}

#[async_trait]
impl PlayerDirectory for FakeDirectory {
    async fn create_player(&self, player: &NewPlayer) -> ApiResult<Player> {
        let mut state = self.state.lock().expect("state lock");
        let key = handle_key(&player.ps_user);
        let taken = state.players.iter().any(|p| handle_key(&p.ps_user) == key)
            || state.aliases.iter().any(|a| handle_key(&a.alias) == key);
        if taken {
            return Err(ApiError::Conflict { resource: "player" });
        }
        state.next_id += 1;
        let created = Player {
            id: state.next_id,
            ps_user: player.ps_user.clone(),
            discord_user: Some(player.discord_user.clone()),
            discord_id: Some(player.discord_id.clone()),
        };
        state.players.push(created.clone());
        Ok(created)
    }

    async fn find_player_by_discord_id(&self, discord_id: &str) -> ApiResult<Player> {
        let state = self.state.lock().expect("state lock");
        state
            .players
            .iter()
            .find(|p| p.discord_id.as_deref() == Some(discord_id))
            .cloned()
            .ok_or(ApiError::NotFound { resource: "player" })
    }

    async fn find_player_by_handle(&self, handle: &str) -> ApiResult<Player> {
        let state = self.state.lock().expect("state lock");
        let key = handle_key(handle);
        let direct = state
            .players
            .iter()
            .find(|p| handle_key(&p.ps_user) == key)
            .cloned();
        let via_alias = state
            .aliases
            .iter()
            .find(|a| handle_key(&a.alias) == key)
            .and_then(|a| state.players.iter().find(|p| p.id == a.player_id).cloned());
        direct
            .or(via_alias)
            .ok_or(ApiError::NotFound { resource: "player" })
    }

    async fn link_discord_to_player(&self, player_id: i64, link: &PlayerLink) -> ApiResult<Player> {
        let mut state = self.state.lock().expect("state lock");
        let player = state
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(ApiError::NotFound { resource: "player" })?;
        player.discord_user = Some(link.discord_user.clone());
        player.discord_id = Some(link.discord_id.clone());
        Ok(player.clone())
    }

    async fn find_alias(&self, alias: &str) -> ApiResult<PlayerAlias> {
        let state = self.state.lock().expect("state lock");
        state
            .aliases
            .iter()
            .find(|a| a.alias == alias)
            .cloned()
            .ok_or(ApiError::NotFound {
                resource: "player alias",
            })
    }

    async fn create_alias(&self, alias: &NewPlayerAlias) -> ApiResult<PlayerAlias> {
        let mut state = self.state.lock().expect("state lock");
        state.next_id += 1;
        let created = PlayerAlias {
            id: state.next_id,
            player_id: alias.player_id,
            alias: alias.alias.clone(),
        };
        state.aliases.push(created.clone());
        Ok(created)
    }
}

fn request(handle: &str, discord_id: &str) -> SignupRequest {
    SignupRequest {
        handle: handle.to_string(),
        discord_user: format!("user-{discord_id}"),
        discord_id: discord_id.to_string(),
    }
}

#[tokio::test]
async fn signup_then_case_variant_then_rival_claim() {
    let directory = FakeDirectory::default();

    // First signup creates exactly one record.
    let first = resolve_signup(&directory, &request("showdownuser1", "U1"))
        .await
        .expect("first signup should succeed");
    let first_id = first.player().id;
    assert!(matches!(first, SignupOutcome::CreatedNew(_)));
    assert_eq!(directory.player_count(), 1);

    // Same person, different case: same player, no new record.
    let second = resolve_signup(&directory, &request("ShowdownUser1", "U1"))
        .await
        .expect("case-variant re-signup should succeed");
    assert!(matches!(second, SignupOutcome::LinkedExisting { .. }));
    assert_eq!(second.player().id, first_id);
    assert_eq!(directory.player_count(), 1);

    // Different Discord account claiming the same handle: rejected, and the
    // original link is untouched.
    let err = resolve_signup(&directory, &request("showdownuser1", "U2"))
        .await
        .expect_err("second account must not take over the handle");
    assert!(matches!(
        err,
        fullrestore_api::IdentityError::ConflictingClaim { .. }
    ));
    assert_eq!(directory.player(first_id).discord_id.as_deref(), Some("U1"));
    assert_eq!(directory.player_count(), 1);
}

#[tokio::test]
async fn repeated_signup_is_idempotent() {
    let directory = FakeDirectory::default();

    let first = resolve_signup(&directory, &request("bigpuffa", "U1"))
        .await
        .expect("first signup should succeed");
    let second = resolve_signup(&directory, &request("bigpuffa", "U1"))
        .await
        .expect("immediate repeat should succeed");

    assert!(matches!(second, SignupOutcome::LinkedExisting { .. }));
    assert_eq!(second.player().id, first.player().id);
    assert_eq!(directory.player_count(), 1);
    assert_eq!(directory.alias_count(), 0);
}

#[tokio::test]
async fn variant_spelling_records_one_alias_across_repeats() {
    // "ash_ketchum" was registered earlier under a different raw signup.
    let directory = FakeDirectory::with_player("ash_ketchum", Some("U1"));

    for _ in 0..3 {
        let outcome = resolve_signup(&directory, &request("Ashketchum", "U1"))
            .await
            .expect("variant signup should succeed");
        assert!(matches!(outcome, SignupOutcome::LinkedExisting { .. }));
    }

    assert_eq!(directory.player_count(), 1);
    assert_eq!(directory.alias_count(), 1);
    let state = directory.state.lock().expect("state lock");
    assert_eq!(state.aliases[0].alias, "ashketchum");
    assert_eq!(state.aliases[0].player_id, 1);
}

#[tokio::test]
async fn unlinked_record_is_claimed_then_stable() {
    // Record imported from the website without a Discord link.
    let directory = FakeDirectory::with_player("venusaurmike", None);

    let outcome = resolve_signup(&directory, &request("VenusaurMike", "U9"))
        .await
        .expect("claiming an unlinked record should succeed");
    match &outcome {
        SignupOutcome::LinkedExisting { player, alias } => {
            assert_eq!(player.discord_id.as_deref(), Some("U9"));
            assert_eq!(*alias, AliasOutcome::NotNeeded);
        }
        other => panic!("expected LinkedExisting, got {other:?}"),
    }
    assert_eq!(directory.player(1).discord_id.as_deref(), Some("U9"));

    // A later signup from the same person changes nothing.
    let again = resolve_signup(&directory, &request("venusaurmike", "U9"))
        .await
        .expect("repeat after claim should succeed");
    assert_eq!(again.player().id, 1);
    assert_eq!(directory.player_count(), 1);
}
