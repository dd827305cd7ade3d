//! Player sign-up reconciliation.
//!
//! Resolves a sign-up attempt (raw Showdown username + Discord identity) to
//! exactly one player record. The same real person may sign up with a new
//! spelling of their handle, from a fresh Discord account, or twice in a
//! row; a different person may try to claim a Showdown account that is
//! already linked. Each case lands in one of the tagged outcomes below
//! instead of being inferred from status codes at the call site.
//!
//! The procedure relies on the backend's uniqueness constraint on the
//! canonical handle (surfaced as a 409 on create) to arbitrate concurrent
//! sign-ups; there is no client-side locking.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewPlayer, NewPlayerAlias, Player, PlayerAlias, PlayerLink};

/// Canonical form of a Showdown username: surrounding whitespace stripped,
/// case folded. Applied before every comparison and before persisting a new
/// canonical handle, so a name differing only by case can never create a
/// duplicate player.
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One sign-up attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SignupRequest {
    /// Raw Showdown username as typed by the user.
    pub handle: String,
    /// Discord display name, kept as secondary metadata on the player.
    pub discord_user: String,
    /// Discord snowflake. At most one player record may be linked to it.
    pub discord_id: String,
}

/// What happened to the raw handle during reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasOutcome {
    /// Raw handle already matches the canonical one, or the alias is
    /// already recorded.
    NotNeeded,
    /// A new alias record was created for this spelling.
    Created(String),
    /// Alias creation failed. Non-fatal: the sign-up itself stands, but the
    /// failure must still reach the admin channel.
    Failed { alias: String, error: String },
}

/// Terminal outcome of a successful reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum SignupOutcome {
    /// First time this canonical handle was seen; a fresh record was
    /// created. No alias work applies.
    CreatedNew(Player),
    /// The handle matched an existing record, now (or already) linked to
    /// the requester's Discord identity.
    LinkedExisting { player: Player, alias: AliasOutcome },
}

impl SignupOutcome {
    pub fn player(&self) -> &Player {
        match self {
            SignupOutcome::CreatedNew(player) => player,
            SignupOutcome::LinkedExisting { player, .. } => player,
        }
    }
}

/// Errors terminating a reconciliation attempt.
#[derive(Debug, Error, Diagnostic)]
pub enum IdentityError {
    /// The Showdown account is linked to a different Discord identity.
    /// Hard error: an operator has to untangle who owns the account.
    #[error("showdown account '{handle}' is already claimed by another discord account")]
    #[diagnostic(
        code(fullrestore_api::conflicting_claim),
        help("Two Discord accounts claim the same Showdown username; resolve manually")
    )]
    ConflictingClaim {
        handle: String,
        requester_discord_id: String,
        /// Discord name currently linked to the handle, when known.
        claimed_by: Option<String>,
        /// Canonical handle already registered to the requester's Discord
        /// account, when one exists. Included for the admin diagnostic.
        requester_existing_handle: Option<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),
}

/// The slice of the backend the reconciliation procedure needs. Implemented
/// by `ApiClient`; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn create_player(&self, player: &NewPlayer) -> ApiResult<Player>;
    async fn find_player_by_discord_id(&self, discord_id: &str) -> ApiResult<Player>;
    async fn find_player_by_handle(&self, handle: &str) -> ApiResult<Player>;
    async fn link_discord_to_player(&self, player_id: i64, link: &PlayerLink) -> ApiResult<Player>;
    async fn find_alias(&self, alias: &str) -> ApiResult<PlayerAlias>;
    async fn create_alias(&self, alias: &NewPlayerAlias) -> ApiResult<PlayerAlias>;
}

#[async_trait]
impl PlayerDirectory for ApiClient {
    async fn create_player(&self, player: &NewPlayer) -> ApiResult<Player> {
        ApiClient::create_player(self, player).await
    }

    async fn find_player_by_discord_id(&self, discord_id: &str) -> ApiResult<Player> {
        ApiClient::find_player_by_discord_id(self, discord_id).await
    }

    async fn find_player_by_handle(&self, handle: &str) -> ApiResult<Player> {
        ApiClient::find_player_by_handle(self, handle).await
    }

    async fn link_discord_to_player(&self, player_id: i64, link: &PlayerLink) -> ApiResult<Player> {
        ApiClient::link_discord_to_player(self, player_id, link).await
    }

    async fn find_alias(&self, alias: &str) -> ApiResult<PlayerAlias> {
        ApiClient::find_alias(self, alias).await
    }

    async fn create_alias(&self, alias: &NewPlayerAlias) -> ApiResult<PlayerAlias> {
        ApiClient::create_alias(self, alias).await
    }
}

/// Resolve a sign-up request to exactly one player record.
///
/// State machine:
/// 1. Attempt to create a player under the normalized handle. Success ends
///    in `CreatedNew`; a conflict means the handle is taken and moves on to
///    conflict resolution; anything else propagates.
/// 2. Conflict resolution: the canonical-handle match is authoritative. A
///    handle linked to a different Discord account is a `ConflictingClaim`
///    and nothing is mutated. An unlinked handle is claimed by linking it
///    to the requester. A handle already linked to the requester is a
///    re-sign-up.
/// 3. If the normalized raw handle still differs from the record's
///    canonical handle, record it as an alias unless one exists. Alias
///    failures never roll back the link.
pub async fn resolve_signup<D: PlayerDirectory + ?Sized>(
    directory: &D,
    request: &SignupRequest,
) -> Result<SignupOutcome, IdentityError> {
    let canonical = normalize_handle(&request.handle);
    let new_player = NewPlayer {
        ps_user: canonical.clone(),
        discord_user: request.discord_user.clone(),
        discord_id: request.discord_id.clone(),
    };

    match directory.create_player(&new_player).await {
        Ok(player) => {
            tracing::info!(handle = %player.ps_user, discord_id = %request.discord_id, "created new player");
            Ok(SignupOutcome::CreatedNew(player))
        }
        Err(err) if err.is_conflict() => resolve_conflict(directory, request, &canonical).await,
        Err(err) => Err(err.into()),
    }
}

async fn resolve_conflict<D: PlayerDirectory + ?Sized>(
    directory: &D,
    request: &SignupRequest,
    canonical: &str,
) -> Result<SignupOutcome, IdentityError> {
    // Best-effort: the requester may have registered before under another
    // handle. Any failure here, transport included, counts as no match.
    let requester_record = directory
        .find_player_by_discord_id(&request.discord_id)
        .await
        .ok();

    // Mandatory: the create conflicted, so a record matching this handle
    // must exist. Failure to find it is a real error.
    let by_handle = directory.find_player_by_handle(canonical).await?;

    match by_handle.discord_id.as_deref() {
        Some(linked) if linked != request.discord_id => {
            tracing::warn!(
                handle = %canonical,
                requester = %request.discord_id,
                linked_to = %linked,
                "conflicting claim on showdown account"
            );
            return Err(IdentityError::ConflictingClaim {
                handle: canonical.to_string(),
                requester_discord_id: request.discord_id.clone(),
                claimed_by: by_handle.discord_user.clone(),
                requester_existing_handle: requester_record.map(|p| p.ps_user),
            });
        }
        Some(_) => {
            // Re-sign-up from the same Discord account; nothing to link.
        }
        None => {
            // Unlinked Showdown identity: claim it for the requester.
            let link = PlayerLink {
                ps_user: by_handle.ps_user.clone(),
                discord_user: request.discord_user.clone(),
                discord_id: request.discord_id.clone(),
            };
            directory.link_discord_to_player(by_handle.id, &link).await?;
            tracing::info!(
                handle = %by_handle.ps_user,
                discord_id = %request.discord_id,
                "linked discord identity to existing player"
            );
        }
    }

    let player = Player {
        discord_user: Some(request.discord_user.clone()),
        discord_id: Some(request.discord_id.clone()),
        ..by_handle
    };
    let alias = maybe_create_alias(directory, request, &player).await;
    Ok(SignupOutcome::LinkedExisting { player, alias })
}

async fn maybe_create_alias<D: PlayerDirectory + ?Sized>(
    directory: &D,
    request: &SignupRequest,
    player: &Player,
) -> AliasOutcome {
    let alias = normalize_handle(&request.handle);
    if alias == normalize_handle(&player.ps_user) {
        return AliasOutcome::NotNeeded;
    }

    match directory.find_alias(&alias).await {
        Ok(_) => AliasOutcome::NotNeeded,
        Err(err) if err.is_not_found() => {
            let new_alias = NewPlayerAlias {
                player_id: player.id,
                alias: alias.clone(),
            };
            match directory.create_alias(&new_alias).await {
                Ok(created) => AliasOutcome::Created(created.alias),
                Err(err) => {
                    tracing::warn!(%alias, player_id = player.id, error = %err, "alias creation failed");
                    AliasOutcome::Failed {
                        alias,
                        error: err.to_string(),
                    }
                }
            }
        }
        Err(err) => {
            tracing::warn!(%alias, error = %err, "alias lookup failed");
            AliasOutcome::Failed {
                alias,
                error: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(handle: &str, discord_id: &str) -> SignupRequest {
        SignupRequest {
            handle: handle.to_string(),
            discord_user: "tester".to_string(),
            discord_id: discord_id.to_string(),
        }
    }

    fn player(id: i64, ps_user: &str, discord_id: Option<&str>) -> Player {
        Player {
            id,
            ps_user: ps_user.to_string(),
            discord_user: discord_id.map(|_| "someone".to_string()),
            discord_id: discord_id.map(str::to_string),
        }
    }

    fn conflict() -> ApiError {
        ApiError::Conflict { resource: "player" }
    }

    fn not_found() -> ApiError {
        ApiError::NotFound { resource: "player" }
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            body: "backend down".to_string(),
        }
    }

    #[test]
    fn normalize_trims_and_case_folds() {
        assert_eq!(normalize_handle("  ShowdownUser1 "), "showdownuser1");
        assert_eq!(normalize_handle("ash_ketchum"), "ash_ketchum");
        assert_eq!(normalize_handle("Ashketchum"), "ashketchum");
    }

    #[tokio::test]
    async fn never_seen_handle_creates_exactly_one_record() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .withf(|p| p.ps_user == "showdownuser1" && p.discord_id == "U1")
            .times(1)
            .returning(|p| {
                Ok(Player {
                    id: 1,
                    ps_user: p.ps_user.clone(),
                    discord_user: Some(p.discord_user.clone()),
                    discord_id: Some(p.discord_id.clone()),
                })
            });

        let outcome = resolve_signup(&directory, &request("ShowdownUser1", "U1"))
            .await
            .expect("signup should succeed");

        match outcome {
            SignupOutcome::CreatedNew(player) => {
                assert_eq!(player.ps_user, "showdownuser1");
                assert_eq!(player.discord_id.as_deref(), Some("U1"));
            }
            other => panic!("expected CreatedNew, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unlinked_handle_is_claimed_by_requester() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Err(not_found()));
        directory
            .expect_find_player_by_handle()
            .withf(|h| h == "bigpuffa")
            .returning(|_| Ok(player(5, "bigpuffa", None)));
        directory
            .expect_link_discord_to_player()
            .withf(|id, link| *id == 5 && link.discord_id == "U1" && link.ps_user == "bigpuffa")
            .times(1)
            .returning(|_, link| {
                Ok(Player {
                    id: 5,
                    ps_user: link.ps_user.clone(),
                    discord_user: Some(link.discord_user.clone()),
                    discord_id: Some(link.discord_id.clone()),
                })
            });

        let outcome = resolve_signup(&directory, &request("BigPuffa", "U1"))
            .await
            .expect("claiming an unlinked handle should succeed");

        match outcome {
            SignupOutcome::LinkedExisting { player, alias } => {
                assert_eq!(player.id, 5);
                assert_eq!(player.discord_id.as_deref(), Some("U1"));
                assert_eq!(alias, AliasOutcome::NotNeeded);
            }
            other => panic!("expected LinkedExisting, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resignup_from_same_account_links_nothing() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Ok(player(5, "bigpuffa", Some("U1"))));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Ok(player(5, "bigpuffa", Some("U1"))));
        // No link_discord_to_player expectation: calling it would panic.

        let outcome = resolve_signup(&directory, &request("bigpuffa", "U1"))
            .await
            .expect("re-signup should succeed");

        match outcome {
            SignupOutcome::LinkedExisting { player, alias } => {
                assert_eq!(player.id, 5);
                assert_eq!(alias, AliasOutcome::NotNeeded);
            }
            other => panic!("expected LinkedExisting, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handle_linked_elsewhere_is_a_conflicting_claim() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Err(not_found()));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Ok(player(5, "showdownuser1", Some("U1"))));
        // No mutation expectations: any link or alias call would panic.

        let err = resolve_signup(&directory, &request("showdownuser1", "U2"))
            .await
            .expect_err("claim by a second discord account must be rejected");

        match err {
            IdentityError::ConflictingClaim {
                handle,
                requester_discord_id,
                ..
            } => {
                assert_eq!(handle, "showdownuser1");
                assert_eq!(requester_discord_id, "U2");
            }
            other => panic!("expected ConflictingClaim, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn variant_spelling_creates_one_alias() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Ok(player(7, "ash_ketchum", Some("U1"))));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Ok(player(7, "ash_ketchum", Some("U1"))));
        directory
            .expect_find_alias()
            .withf(|a| a == "ashketchum")
            .returning(|_| Err(ApiError::NotFound { resource: "player alias" }));
        directory
            .expect_create_alias()
            .withf(|a| a.player_id == 7 && a.alias == "ashketchum")
            .times(1)
            .returning(|a| {
                Ok(PlayerAlias {
                    id: 1,
                    player_id: a.player_id,
                    alias: a.alias.clone(),
                })
            });

        let outcome = resolve_signup(&directory, &request("Ashketchum", "U1"))
            .await
            .expect("signup with a variant spelling should succeed");

        match outcome {
            SignupOutcome::LinkedExisting { alias, .. } => {
                assert_eq!(alias, AliasOutcome::Created("ashketchum".to_string()));
            }
            other => panic!("expected LinkedExisting, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn known_alias_is_not_duplicated() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Ok(player(7, "ash_ketchum", Some("U1"))));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Ok(player(7, "ash_ketchum", Some("U1"))));
        directory.expect_find_alias().returning(|a| {
            Ok(PlayerAlias {
                id: 1,
                player_id: 7,
                alias: a.to_string(),
            })
        });
        // No create_alias expectation: a duplicate insert would panic.

        let outcome = resolve_signup(&directory, &request("Ashketchum", "U1"))
            .await
            .expect("repeat signup should succeed");

        match outcome {
            SignupOutcome::LinkedExisting { alias, .. } => {
                assert_eq!(alias, AliasOutcome::NotNeeded);
            }
            other => panic!("expected LinkedExisting, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn alias_failure_does_not_roll_back_the_link() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Err(not_found()));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Ok(player(7, "ash_ketchum", None)));
        directory
            .expect_link_discord_to_player()
            .times(1)
            .returning(|_, link| {
                Ok(Player {
                    id: 7,
                    ps_user: "ash_ketchum".to_string(),
                    discord_user: Some(link.discord_user.clone()),
                    discord_id: Some(link.discord_id.clone()),
                })
            });
        directory
            .expect_find_alias()
            .returning(|_| Err(ApiError::NotFound { resource: "player alias" }));
        directory
            .expect_create_alias()
            .returning(|_| Err(server_error()));

        let outcome = resolve_signup(&directory, &request("Ashketchum", "U1"))
            .await
            .expect("alias failure must not fail the signup");

        match outcome {
            SignupOutcome::LinkedExisting { player, alias } => {
                assert_eq!(player.discord_id.as_deref(), Some("U1"));
                assert!(matches!(alias, AliasOutcome::Failed { .. }));
            }
            other => panic!("expected LinkedExisting, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn discord_id_lookup_failure_is_tolerated() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        // Transport-level failure, not just a miss: still only best-effort.
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Err(server_error()));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Ok(player(5, "bigpuffa", None)));
        directory
            .expect_link_discord_to_player()
            .times(1)
            .returning(|_, link| {
                Ok(Player {
                    id: 5,
                    ps_user: "bigpuffa".to_string(),
                    discord_user: Some(link.discord_user.clone()),
                    discord_id: Some(link.discord_id.clone()),
                })
            });

        let outcome = resolve_signup(&directory, &request("bigpuffa", "U1"))
            .await
            .expect("discord-id lookup failure must not abort reconciliation");

        assert_eq!(outcome.player().id, 5);
    }

    #[tokio::test]
    async fn mandatory_handle_lookup_failure_propagates() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(conflict()));
        directory
            .expect_find_player_by_discord_id()
            .returning(|_| Err(not_found()));
        directory
            .expect_find_player_by_handle()
            .returning(|_| Err(server_error()));

        let err = resolve_signup(&directory, &request("bigpuffa", "U1"))
            .await
            .expect_err("handle lookup failure is fatal");

        assert!(matches!(err, IdentityError::Api(ApiError::Status { .. })));
    }

    #[tokio::test]
    async fn fatal_create_error_propagates_without_further_calls() {
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_create_player()
            .returning(|_| Err(server_error()));
        // No lookup expectations: any further call would panic.

        let err = resolve_signup(&directory, &request("bigpuffa", "U1"))
            .await
            .expect_err("non-conflict create failure is fatal");

        assert!(matches!(err, IdentityError::Api(ApiError::Status { .. })));
    }
}
