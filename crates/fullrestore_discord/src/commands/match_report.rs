//! `/match`: record, announce, and undo match results. Runs inside the
//! pairing's scheduling thread.

use fullrestore_api::models::{NewReplay, Pairing, Round, Tournament};
use serenity::builder::{CreateAllowedMentions, CreateEmbed, CreateMessage};
use serenity::client::Context;
use serenity::model::application::{CommandDataOption, CommandInteraction};
use serenity::model::id::{ChannelId, UserId};

use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::helpers;

pub async fn run(ctx: &Context, bot: &BotContext, cmd: &CommandInteraction) -> Result<()> {
    let Some((sub, options)) = helpers::subcommand(cmd) else {
        return helpers::respond(ctx, cmd, "Unknown subcommand.", true).await;
    };

    let tournament = match helpers::tournament_for_thread(ctx, bot, cmd).await {
        Ok(tournament) => tournament,
        Err(DiscordError::NoTournament) => {
            return helpers::respond(
                ctx,
                cmd,
                "Run this inside the pairing's scheduling thread.",
                true,
            )
            .await;
        }
        Err(err) => return Err(err),
    };

    match sub {
        "report" => report(ctx, bot, cmd, &tournament, options, true).await,
        "activity" => report(ctx, bot, cmd, &tournament, options, false).await,
        "undo" => undo(ctx, bot, cmd, &tournament, options).await,
        _ => helpers::respond(ctx, cmd, "Unknown subcommand.", true).await,
    }
}

/// The pairing between `winner` and `loser` in `round_number`, plus whether
/// the winner is on the left-hand side.
async fn locate_pairing(
    bot: &BotContext,
    tournament: &Tournament,
    round_number: i64,
    winner: UserId,
    loser: UserId,
) -> Result<Option<(Round, Pairing, bool)>> {
    let round = bot.api.find_round(&tournament.slug, round_number).await?;
    let pairing = match bot.api.find_pairing(round.id, &winner.to_string()).await {
        Ok(pairing) => pairing,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let winner_id = winner.to_string();
    let loser_id = loser.to_string();
    let winner_on_left = if pairing.entrant1.player.discord_id.as_deref() == Some(&winner_id)
        && pairing.entrant2.player.discord_id.as_deref() == Some(&loser_id)
    {
        true
    } else if pairing.entrant2.player.discord_id.as_deref() == Some(&winner_id)
        && pairing.entrant1.player.discord_id.as_deref() == Some(&loser_id)
    {
        false
    } else {
        return Ok(None);
    };

    Ok(Some((round, pairing, winner_on_left)))
}

async fn report(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
    with_replays: bool,
) -> Result<()> {
    let round_number = helpers::req_i64(options, "round")?;
    let winner = helpers::req_user(options, "winner")?;
    let loser = helpers::req_user(options, "loser")?;

    let replays: Vec<String> = if with_replays {
        let mut replays = vec![helpers::req_str(options, "replay1")?.to_string()];
        for game in 2..=5 {
            if let Some(url) = helpers::opt_str(options, &format!("replay{game}")) {
                replays.push(url.to_string());
            }
        }
        replays
    } else {
        Vec::new()
    };

    cmd.defer(&ctx.http).await?;

    let Some((round, pairing, winner_on_left)) =
        locate_pairing(bot, tournament, round_number, winner, loser).await?
    else {
        return helpers::respond(
            ctx,
            cmd,
            format!("Those players are not paired together in round {round_number}."),
            true,
        )
        .await;
    };
    if pairing.has_result() {
        return helpers::respond(
            ctx,
            cmd,
            "This pairing already has a result. Use `/match undo` to change it.",
            true,
        )
        .await;
    }

    let winner_entrant = if winner_on_left {
        &pairing.entrant1
    } else {
        &pairing.entrant2
    };
    bot.api
        .report_winner(pairing.id, Some(winner_entrant.id))
        .await?;

    for (index, url) in replays.iter().enumerate() {
        let replay = NewReplay {
            pairing_id: pairing.id,
            url: url.clone(),
            match_number: index as i64 + 1,
        };
        if let Err(err) = bot.api.create_replay(&replay).await {
            return Err(helpers::escalate(
                ctx,
                cmd,
                bot,
                Some(tournament),
                "The result was recorded but saving a replay failed; the admins have been notified.",
                format!("Replay {} failed for pairing {}: {err}", index + 1, pairing.id),
            )
            .await);
        }
    }

    announce_result(ctx, tournament, &round, &pairing, winner_on_left, &replays).await;

    helpers::respond(
        ctx,
        cmd,
        format!(
            "Result recorded: {} defeats {} in round {round_number}. GGs!",
            helpers::mention(winner.get()),
            helpers::mention(loser.get())
        ),
        false,
    )
    .await
}

/// Post the result embed to the tournament's results channel. Best-effort;
/// the recorded result is authoritative.
async fn announce_result(
    ctx: &Context,
    tournament: &Tournament,
    round: &Round,
    pairing: &Pairing,
    winner_on_left: bool,
    replays: &[String],
) {
    let Some(channel) = tournament
        .result_snowflake
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .map(ChannelId::new)
    else {
        return;
    };

    let left = &pairing.entrant1.player.ps_user;
    let right = &pairing.entrant2.player.ps_user;
    let mut description = format!(
        "{left} {} {right}\n[Match page]({})",
        helpers::winner_marker(winner_on_left),
        helpers::match_page_url(
            &tournament.format,
            &tournament.slug,
            round.round_number,
            left,
            right
        )
    );
    for (index, url) in replays.iter().enumerate() {
        description.push_str(&format!("\n[Game {}]({url})", index + 1));
    }

    let embed = CreateEmbed::new()
        .title(format!(
            "Round {}: {}",
            round.round_number,
            helpers::thread_name(left, right)
        ))
        .description(description);
    let message = CreateMessage::new().embed(embed).allowed_mentions(
        CreateAllowedMentions::new()
            .everyone(false)
            .all_users(false)
            .all_roles(false),
    );
    if let Err(err) = channel.send_message(&ctx.http, message).await {
        tracing::warn!(%err, "could not post the result embed");
    }
}

async fn undo(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
) -> Result<()> {
    let round_number = helpers::req_i64(options, "round")?;
    let winner = helpers::req_user(options, "winner")?;
    let loser = helpers::req_user(options, "loser")?;

    let Some((_, pairing, _)) =
        locate_pairing(bot, tournament, round_number, winner, loser).await?
    else {
        return helpers::respond(
            ctx,
            cmd,
            format!("Those players are not paired together in round {round_number}."),
            true,
        )
        .await;
    };
    if !pairing.has_result() {
        return helpers::respond(ctx, cmd, "This pairing has no result to undo.", true).await;
    }

    bot.api.report_winner(pairing.id, None).await?;
    helpers::respond(
        ctx,
        cmd,
        format!(
            "Round {round_number} result between {} and {} has been cleared; report again with \
             `/match report`.",
            helpers::mention(winner.get()),
            helpers::mention(loser.get())
        ),
        false,
    )
    .await
}
