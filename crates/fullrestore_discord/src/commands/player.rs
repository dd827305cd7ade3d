//! `/player`: admin management of sign-ups and byes. Runs in a
//! tournament's admin channel.

use fullrestore_api::models::{NewRoundBye, Tournament};
use serenity::client::Context;
use serenity::model::application::{CommandDataOption, CommandInteraction};

use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::helpers;

pub async fn run(ctx: &Context, bot: &BotContext, cmd: &CommandInteraction) -> Result<()> {
    let Some((sub, options)) = helpers::subcommand(cmd) else {
        return helpers::respond(ctx, cmd, "Unknown subcommand.", true).await;
    };

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

    match sub {
        "signup" => signup(ctx, bot, cmd, &tournament, options).await,
        "remove" => remove(ctx, bot, cmd, &tournament, options).await,
        "list" => list(ctx, bot, cmd, &tournament).await,
        "add-bye" => add_bye(ctx, bot, cmd, &tournament, options).await,
        "remove-bye" => remove_bye(ctx, bot, cmd, &tournament, options).await,
        _ => helpers::respond(ctx, cmd, "Unknown subcommand.", true).await,
    }
}

async fn signup(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
) -> Result<()> {
    let user_id = helpers::req_user(options, "user")?;
    let handle = helpers::req_str(options, "ps_username")?.to_string();
    let user = user_id.to_user(&ctx.http).await?;
    super::signup::enroll(ctx, bot, cmd, tournament, &user, &handle).await
}

async fn remove(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
) -> Result<()> {
    let user_id = helpers::req_user(options, "user")?;
    let entrant = match bot
        .api
        .find_entrant(&tournament.slug, &user_id.to_string())
        .await
    {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return helpers::respond(
                ctx,
                cmd,
                "That player is not signed up for this tournament.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };

    bot.api
        .delete_entrant(entrant.player.id, &tournament.slug)
        .await?;
    super::signup::revoke_tournament_role(ctx, bot, tournament, user_id).await;

    helpers::respond(
        ctx,
        cmd,
        format!(
            "Removed {} from {}.",
            helpers::mention(user_id.get()),
            tournament.name
        ),
        false,
    )
    .await
}

/// Mentions cap out well below this, and chunking keeps each message under
/// the 2000-character content limit.
const LIST_CHUNK: usize = 50;

async fn list(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
) -> Result<()> {
    let entrants = bot.api.list_entrants(&tournament.slug).await?;
    if entrants.is_empty() {
        return helpers::respond(ctx, cmd, "Nobody has signed up yet.", true).await;
    }

    let chunks = helpers::entrant_lines(&entrants, LIST_CHUNK);
    match bot.config.bot_log_channel {
        Some(channel) => {
            helpers::send_quiet(
                ctx,
                channel,
                format!("Entrants for {} ({}):", tournament.name, entrants.len()),
            )
            .await?;
            for chunk in chunks {
                helpers::send_quiet(ctx, channel, chunk).await?;
            }
            helpers::respond(
                ctx,
                cmd,
                format!(
                    "Posted {} entrants to {}.",
                    entrants.len(),
                    helpers::mention_channel(channel.get())
                ),
                true,
            )
            .await
        }
        None => {
            helpers::respond(
                ctx,
                cmd,
                format!("Entrants for {} ({}):", tournament.name, entrants.len()),
                true,
            )
            .await?;
            for chunk in chunks {
                helpers::respond(ctx, cmd, chunk, true).await?;
            }
            Ok(())
        }
    }
}

async fn add_bye(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
) -> Result<()> {
    let round_number = helpers::req_i64(options, "round")?;
    let user_id = helpers::req_user(options, "user")?;

    let round = bot.api.find_round(&tournament.slug, round_number).await?;
    let entrant = match bot
        .api
        .find_entrant(&tournament.slug, &user_id.to_string())
        .await
    {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return helpers::respond(
                ctx,
                cmd,
                "That player is not signed up for this tournament.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };

    let bye = NewRoundBye {
        round_id: round.id,
        entrant_player_id: entrant.id,
    };
    match bot.api.create_bye(&bye).await {
        Ok(_) => {
            helpers::respond(
                ctx,
                cmd,
                format!(
                    "{} has a bye for round {round_number}.",
                    helpers::mention(user_id.get())
                ),
                false,
            )
            .await
        }
        Err(err) if err.is_conflict() => {
            helpers::respond(
                ctx,
                cmd,
                "That player already has a bye for this round.",
                true,
            )
            .await
        }
        Err(err) => Err(err.into()),
    }
}

async fn remove_bye(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
) -> Result<()> {
    let round_number = helpers::req_i64(options, "round")?;
    let user_id = helpers::req_user(options, "user")?;

    let round = bot.api.find_round(&tournament.slug, round_number).await?;
    let entrant = match bot
        .api
        .find_entrant(&tournament.slug, &user_id.to_string())
        .await
    {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return helpers::respond(
                ctx,
                cmd,
                "That player is not signed up for this tournament.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };

    let bye = match bot.api.find_bye(round.id, entrant.id).await {
        Ok(bye) => bye,
        Err(err) if err.is_not_found() => {
            return helpers::respond(
                ctx,
                cmd,
                "That player has no bye for this round.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };

    bot.api.delete_bye(bye.id).await?;
    helpers::respond(
        ctx,
        cmd,
        format!(
            "Removed round {round_number} bye from {}.",
            helpers::mention(user_id.get())
        ),
        false,
    )
    .await
}
