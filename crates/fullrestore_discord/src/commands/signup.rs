//! `/in`: self sign-up in a tournament's sign-up channel.

use fullrestore_api::identity::{resolve_signup, AliasOutcome, SignupOutcome, SignupRequest};
use fullrestore_api::models::{NewEntrant, Tournament};
use fullrestore_api::ApiError;
use fullrestore_api::IdentityError;
use serenity::builder::CreateMessage;
use serenity::client::Context;
use serenity::model::application::CommandInteraction;
use serenity::model::id::{ChannelId, RoleId};
use serenity::model::user::User;

use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::helpers;

pub async fn run(ctx: &Context, bot: &BotContext, cmd: &CommandInteraction) -> Result<()> {
    let tournament = match helpers::tournament_for_signup_channel(bot, cmd).await {
        Ok(tournament) => tournament,
        Err(DiscordError::NoTournament) => {
            return helpers::respond(ctx, cmd, "No tournament found in this channel.", true).await;
        }
        Err(err) => return Err(err),
    };

    let handle = helpers::req_str(&cmd.data.options, "ps_username")?.to_string();
    enroll(ctx, bot, cmd, &tournament, &cmd.user, &handle).await
}

/// Sign `user` up for `tournament` under the Showdown username `handle`.
///
/// Shared by `/in` (the invoker signs themselves up) and `/player signup`
/// (an admin signs someone else up). Resolves the player identity, registers
/// the entrant, grants the tournament role, and announces the sign-up in the
/// channel the command ran in.
pub async fn enroll(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    user: &User,
    handle: &str,
) -> Result<()> {
    let request = SignupRequest {
        handle: handle.to_string(),
        discord_user: user.name.clone(),
        discord_id: user.id.to_string(),
    };

    let outcome = match resolve_signup(&bot.api, &request).await {
        Ok(outcome) => outcome,
        Err(err @ IdentityError::ConflictingClaim { .. }) => {
            return Err(helpers::escalate(
                ctx,
                cmd,
                bot,
                Some(tournament),
                "That Showdown username is already registered to a different Discord account. \
                 If it's yours, please contact a tournament admin.",
                format!("Sign-up rejected for {}: {err}", user.name),
            )
            .await);
        }
        Err(IdentityError::Api(err)) => {
            return Err(helpers::escalate(
                ctx,
                cmd,
                bot,
                Some(tournament),
                "Something went wrong signing you up, the admins have been notified.",
                format!("Sign-up failed for {} ('{handle}'): {err}", user.name),
            )
            .await);
        }
    };

    if let SignupOutcome::LinkedExisting {
        alias: AliasOutcome::Failed { alias, error },
        ..
    } = &outcome
    {
        notify_admins(
            ctx,
            bot,
            tournament,
            format!(
                "Could not record alias '{alias}' for {} while signing up: {error}",
                user.name
            ),
        )
        .await;
    }

    let entrant = NewEntrant {
        player_id: outcome.player().id,
        tournament_slug: tournament.slug.clone(),
    };
    match bot.api.create_entrant(&entrant).await {
        Ok(_) => {}
        Err(ApiError::Conflict { .. }) => {
            return helpers::respond(
                ctx,
                cmd,
                "You're already signed up for this tournament!",
                true,
            )
            .await;
        }
        Err(err) => {
            return Err(helpers::escalate(
                ctx,
                cmd,
                bot,
                Some(tournament),
                "Something went wrong signing you up, the admins have been notified.",
                format!(
                    "Entrant creation failed for {} in '{}': {err}",
                    user.name, tournament.slug
                ),
            )
            .await);
        }
    }

    grant_tournament_role(ctx, bot, tournament, user).await;

    helpers::respond(
        ctx,
        cmd,
        format!(
            "{} has signed up: Showdown username '{handle}'!",
            helpers::mention(user.id.get())
        ),
        false,
    )
    .await
}

/// Grant the tournament's entrant role, if one is configured. Best-effort:
/// the entrant record is authoritative, the role is cosmetic.
async fn grant_tournament_role(
    ctx: &Context,
    bot: &BotContext,
    tournament: &Tournament,
    user: &User,
) {
    let Some(role) = tournament_role(tournament) else {
        return;
    };
    if let Err(err) = ctx
        .http
        .add_member_role(bot.config.guild_id, user.id, role, Some("tournament sign-up"))
        .await
    {
        tracing::warn!(%err, user = %user.name, "failed to grant tournament role");
    }
}

/// Revoke the tournament's entrant role, if one is configured. Best-effort.
pub async fn revoke_tournament_role(
    ctx: &Context,
    bot: &BotContext,
    tournament: &Tournament,
    user_id: serenity::model::id::UserId,
) {
    let Some(role) = tournament_role(tournament) else {
        return;
    };
    if let Err(err) = ctx
        .http
        .remove_member_role(bot.config.guild_id, user_id, role, Some("tournament withdrawal"))
        .await
    {
        tracing::warn!(%err, %user_id, "failed to revoke tournament role");
    }
}

fn tournament_role(tournament: &Tournament) -> Option<RoleId> {
    tournament
        .role_snowflake
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .map(RoleId::new)
}

/// Post a non-fatal warning to the tournament's admin channel (or the bot
/// log channel) without touching the interaction reply.
async fn notify_admins(ctx: &Context, bot: &BotContext, tournament: &Tournament, detail: String) {
    tracing::warn!(%detail, "notifying admins");
    let channel = tournament
        .admin_snowflake
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .map(ChannelId::new)
        .or(bot.config.bot_log_channel);
    if let Some(channel) = channel {
        channel
            .send_message(&ctx.http, CreateMessage::new().content(detail))
            .await
            .ok();
    }
}
