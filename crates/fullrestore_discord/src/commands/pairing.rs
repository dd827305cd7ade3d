//! `/pairing`: create, delete, and substitute into pairings.
//!
//! `create` and `delete` run in the tournament's admin channel;
//! `substitute` runs inside the scheduling thread it modifies.

use fullrestore_api::models::{NewPairing, Pairing};
use serenity::builder::{CreateInteractionResponseFollowup, EditChannel};
use serenity::client::Context;
use serenity::model::application::{CommandDataOption, CommandInteraction};
use serenity::model::id::UserId;

use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::helpers;
use crate::threads;

pub async fn run(ctx: &Context, bot: &BotContext, cmd: &CommandInteraction) -> Result<()> {
    let Some((sub, options)) = helpers::subcommand(cmd) else {
        return helpers::respond(ctx, cmd, "Unknown subcommand.", true).await;
    };

    match sub {
        "create" => create(ctx, bot, cmd, options).await,
        "delete" => delete(ctx, bot, cmd, options).await,
        "substitute" => substitute(ctx, bot, cmd, options).await,
        _ => helpers::respond(ctx, cmd, "Unknown subcommand.", true).await,
    }
}

/// Admin diagnostic for a substitution that deleted the old pairing but
/// could not create its replacement. The old row is gone at this point, so
/// the message has to carry everything needed to repair the bracket.
fn substitution_failure_detail(
    pairing_id: i64,
    round_number: i64,
    err: &fullrestore_api::ApiError,
) -> String {
    format!(
        "Substitution in round {round_number} is half-applied: pairing {pairing_id} was deleted \
         but its replacement could not be created ({err}). Recreate it with `/pairing create`."
    )
}

/// Which side of a pairing a Discord account is on.
fn side_of(pairing: &Pairing, discord_id: &str) -> Option<usize> {
    if pairing.entrant1.player.discord_id.as_deref() == Some(discord_id) {
        Some(1)
    } else if pairing.entrant2.player.discord_id.as_deref() == Some(discord_id) {
        Some(2)
    } else {
        None
    }
}

async fn create(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    options: &[CommandDataOption],
) -> Result<()> {
    let tournament = match helpers::tournament_for_admin_channel(bot, cmd).await {
        Ok(tournament) => tournament,
        Err(DiscordError::NoTournament) => {
            return helpers::respond(
                ctx,
                cmd,
                "This is not the admin channel of any tournament.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err),
    };

    let round_number = helpers::req_i64(options, "round")?;
    let player1 = helpers::req_user(options, "player1")?;
    let player2 = helpers::req_user(options, "player2")?;
    let pool = helpers::req_channel(options, "pool")?;
    let role = helpers::req_role(options, "role")?;
    let moderator = helpers::req_user(options, "moderator")?;
    let deadline = helpers::req_str(options, "deadline")?.to_string();

    cmd.defer(&ctx.http).await?;

    let round = bot.api.find_round(&tournament.slug, round_number).await?;
    let entrant1 = match bot
        .api
        .find_entrant(&tournament.slug, &player1.to_string())
        .await
    {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return missing_entrant(ctx, cmd, player1).await;
        }
        Err(err) => return Err(err.into()),
    };
    let entrant2 = match bot
        .api
        .find_entrant(&tournament.slug, &player2.to_string())
        .await
    {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return missing_entrant(ctx, cmd, player2).await;
        }
        Err(err) => return Err(err.into()),
    };

    let pairing = NewPairing {
        round_id: round.id,
        entrant1_id: entrant1.id,
        entrant2_id: entrant2.id,
    };
    let pairing = match bot.api.create_pairing(&pairing).await {
        Ok(pairing) => pairing,
        Err(err) if err.is_conflict() => {
            return helpers::respond(
                ctx,
                cmd,
                format!("Those players are already paired in round {round_number}."),
                true,
            )
            .await;
        }
        Err(err) => {
            return Err(helpers::escalate(
                ctx,
                cmd,
                bot,
                Some(&tournament),
                "Could not create the pairing, the admins have been notified.",
                format!(
                    "Pairing creation failed in round {round_number} of '{}': {err}",
                    tournament.slug
                ),
            )
            .await);
        }
    };

    let left = player1.to_user(&ctx.http).await?;
    let right = player2.to_user(&ctx.http).await?;
    let thread =
        threads::create_pairing_thread(ctx, bot, pool, &left, &right, role, moderator, &deadline)
            .await?;

    helpers::respond(
        ctx,
        cmd,
        format!(
            "Pairing {} created for round {round_number}; scheduling thread {}.",
            pairing.id,
            helpers::mention_channel(thread.id.get())
        ),
        false,
    )
    .await
}

async fn missing_entrant(ctx: &Context, cmd: &CommandInteraction, user: UserId) -> Result<()> {
    helpers::respond(
        ctx,
        cmd,
        format!(
            "{} is not signed up for this tournament.",
            helpers::mention(user.get())
        ),
        true,
    )
    .await
}

async fn delete(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    options: &[CommandDataOption],
) -> Result<()> {
    let tournament = match helpers::tournament_for_admin_channel(bot, cmd).await {
        Ok(tournament) => tournament,
        Err(DiscordError::NoTournament) => {
            return helpers::respond(
                ctx,
                cmd,
                "This is not the admin channel of any tournament.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err),
    };

    let round_number = helpers::req_i64(options, "round")?;
    let player1 = helpers::req_user(options, "player1")?;
    let player2 = helpers::req_user(options, "player2")?;

    let round = bot.api.find_round(&tournament.slug, round_number).await?;
    let pairing = match bot.api.find_pairing(round.id, &player1.to_string()).await {
        Ok(pairing) => pairing,
        Err(err) if err.is_not_found() => {
            return helpers::respond(
                ctx,
                cmd,
                format!("No round {round_number} pairing found for those players."),
                true,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };
    if side_of(&pairing, &player2.to_string()).is_none() {
        return helpers::respond(
            ctx,
            cmd,
            format!("Those players are not paired together in round {round_number}."),
            true,
        )
        .await;
    }

    if pairing.has_result() {
        return helpers::respond(
            ctx,
            cmd,
            "This pairing already has a reported result. Undo it with `/match undo` first.",
            true,
        )
        .await;
    }

    let prompt = format!(
        "Delete the round {round_number} pairing between {} and {}?",
        helpers::mention(player1.get()),
        helpers::mention(player2.get())
    );
    if !helpers::confirm_action(ctx, cmd, &prompt, "Deleting pairing.", "pairing kept").await? {
        return Ok(());
    }

    bot.api.delete_pairing(pairing.id).await?;
    cmd.create_followup(
        &ctx.http,
        CreateInteractionResponseFollowup::new()
            .content(format!("Pairing {} deleted.", pairing.id))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

async fn substitute(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    options: &[CommandDataOption],
) -> Result<()> {
    let tournament = match helpers::tournament_for_thread(ctx, bot, cmd).await {
        Ok(tournament) => tournament,
        Err(DiscordError::NoTournament) => {
            return helpers::respond(
                ctx,
                cmd,
                "Run this inside the scheduling thread you want to change.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err),
    };

    let round_number = helpers::req_i64(options, "round")?;
    let old_player = helpers::req_user(options, "old_player")?;
    let new_player = helpers::req_user(options, "new_player")?;

    let round = bot.api.find_round(&tournament.slug, round_number).await?;
    let pairing = match bot
        .api
        .find_pairing(round.id, &old_player.to_string())
        .await
    {
        Ok(pairing) => pairing,
        Err(err) if err.is_not_found() => {
            return helpers::respond(
                ctx,
                cmd,
                format!(
                    "{} has no round {round_number} pairing.",
                    helpers::mention(old_player.get())
                ),
                true,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };
    if pairing.has_result() {
        return helpers::respond(
            ctx,
            cmd,
            "This pairing already has a reported result. Undo it with `/match undo` first.",
            true,
        )
        .await;
    }

    let new_entrant = match bot
        .api
        .find_entrant(&tournament.slug, &new_player.to_string())
        .await
    {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return missing_entrant(ctx, cmd, new_player).await;
        }
        Err(err) => return Err(err.into()),
    };

    let prompt = format!(
        "Substitute {} in for {} in this pairing?",
        helpers::mention(new_player.get()),
        helpers::mention(old_player.get())
    );
    if !helpers::confirm_action(ctx, cmd, &prompt, "Substituting.", "pairing unchanged").await? {
        return Ok(());
    }

    // The backend has no pairing-update endpoint; replace the row.
    let out_is_left = match side_of(&pairing, &old_player.to_string()) {
        Some(1) => true,
        Some(_) => false,
        None => {
            cmd.create_followup(
                &ctx.http,
                CreateInteractionResponseFollowup::new()
                    .content("That player is not part of this pairing.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };
    let (entrant1_id, entrant2_id, staying) = if out_is_left {
        (new_entrant.id, pairing.entrant2.id, &pairing.entrant2)
    } else {
        (pairing.entrant1.id, new_entrant.id, &pairing.entrant1)
    };

    bot.api.delete_pairing(pairing.id).await?;
    let replacement = NewPairing {
        round_id: round.id,
        entrant1_id,
        entrant2_id,
    };
    if let Err(err) = bot.api.create_pairing(&replacement).await {
        return Err(helpers::escalate(
            ctx,
            cmd,
            bot,
            Some(&tournament),
            "The substitution failed partway; the admins have been notified.",
            substitution_failure_detail(pairing.id, round_number, &err),
        )
        .await);
    }

    // Thread membership and title follow the pairing; both best-effort.
    if let Err(err) = ctx
        .http
        .add_thread_channel_member(cmd.channel_id, new_player)
        .await
    {
        tracing::warn!(%err, "could not add substitute to the thread");
    }
    if let Err(err) = ctx
        .http
        .remove_thread_channel_member(cmd.channel_id, old_player)
        .await
    {
        tracing::warn!(%err, "could not remove substituted player from the thread");
    }
    let new_name = if out_is_left {
        helpers::thread_name(&new_entrant.player.ps_user, &staying.player.ps_user)
    } else {
        helpers::thread_name(&staying.player.ps_user, &new_entrant.player.ps_user)
    };
    if let Err(err) = cmd
        .channel_id
        .edit(&ctx.http, EditChannel::new().name(new_name))
        .await
    {
        tracing::warn!(%err, "could not rename the scheduling thread");
    }

    cmd.create_followup(
        &ctx.http,
        CreateInteractionResponseFollowup::new().content(format!(
            "{} is out, {} is in. Please schedule with the new opponent!",
            helpers::mention(old_player.get()),
            helpers::mention(new_player.get())
        )),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fullrestore_api::ApiError;

    #[test]
    fn half_applied_substitution_names_the_deleted_pairing_and_the_repair() {
        let err = ApiError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        let detail = substitution_failure_detail(42, 3, &err);
        assert!(detail.contains("pairing 42 was deleted"));
        assert!(detail.contains("round 3"));
        assert!(detail.contains("503"));
        assert!(detail.contains("/pairing create"));
    }
}
