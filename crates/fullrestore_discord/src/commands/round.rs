//! `/round`: round bookkeeping and bulk pairing of a pool. Runs in a
//! tournament's admin channel.

use fullrestore_api::models::{NewRound, Tournament};
use serenity::builder::CreateMessage;
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
        "init" => init(ctx, bot, cmd, &tournament, options).await,
        "pair" => pair(ctx, bot, cmd, options).await,
        _ => helpers::respond(ctx, cmd, "Unknown subcommand.", true).await,
    }
}

async fn init(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    tournament: &Tournament,
    options: &[CommandDataOption],
) -> Result<()> {
    let round_number = helpers::req_i64(options, "number")?;
    let deadline = helpers::opt_str(options, "deadline").map(str::to_string);
    if let Some(deadline) = &deadline {
        if chrono::NaiveDate::parse_from_str(deadline, "%Y-%m-%d").is_err() {
            return helpers::respond(
                ctx,
                cmd,
                format!("Deadline '{deadline}' is not a YYYY-MM-DD date."),
                true,
            )
            .await;
        }
    }

    let round = NewRound {
        tournament_slug: tournament.slug.clone(),
        round_number,
        deadline,
    };
    match bot.api.create_round(&round).await {
        Ok(round) => {
            helpers::respond(
                ctx,
                cmd,
                format!(
                    "Round {} readied for {}.",
                    round.round_number, tournament.name
                ),
                false,
            )
            .await
        }
        Err(err) if err.is_conflict() => {
            helpers::respond(
                ctx,
                cmd,
                format!("Round {round_number} already exists for {}.", tournament.name),
                true,
            )
            .await
        }
        Err(err) => Err(err.into()),
    }
}

/// Parse a space-separated list of user ids or mentions.
fn parse_user_ids(raw: &str) -> Vec<UserId> {
    raw.split_whitespace()
        .map(|token| token.trim_start_matches("<@").trim_end_matches('>'))
        .filter_map(|token| token.parse::<u64>().ok())
        .map(UserId::new)
        .collect()
}

/// Pairings made here live on Discord only: the scheduling threads are the
/// artifact, backend pairing rows are created separately via `/pairing`.
async fn pair(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    options: &[CommandDataOption],
) -> Result<()> {
    let pool = helpers::req_channel(options, "pool")?;
    let role = helpers::req_role(options, "role")?;
    let moderator = helpers::req_user(options, "moderator")?;
    let deadline = helpers::req_str(options, "deadline")?.to_string();
    let left_ids = parse_user_ids(helpers::req_str(options, "left")?);
    let right_ids = parse_user_ids(helpers::req_str(options, "right")?);
    let header = helpers::opt_str(options, "header").map(str::to_string);

    if left_ids.len() != right_ids.len() || left_ids.is_empty() {
        return helpers::respond(
            ctx,
            cmd,
            format!(
                "Left and right lists must be non-empty and the same length \
                 (got {} and {}).",
                left_ids.len(),
                right_ids.len()
            ),
            true,
        )
        .await;
    }

    // Thread creation for a full pool outlives the initial-response window.
    cmd.defer(&ctx.http).await?;

    if let Some(header) = header {
        pool.send_message(&ctx.http, CreateMessage::new().content(header))
            .await?;
    }

    let deadline_stamp = format_deadline(&deadline);
    let mut created = 0usize;
    let mut skipped: Vec<String> = Vec::new();
    for (left_id, right_id) in left_ids.iter().zip(right_ids.iter()) {
        let left = match left_id.to_user(&ctx.http).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(%err, user_id = %left_id, "could not fetch left-side member");
                skipped.push(format!("{} vs. {}", left_id, right_id));
                continue;
            }
        };
        let right = match right_id.to_user(&ctx.http).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(%err, user_id = %right_id, "could not fetch right-side member");
                skipped.push(format!("{} vs. {}", left_id, right_id));
                continue;
            }
        };

        match threads::create_pairing_thread(
            ctx,
            bot,
            pool,
            &left,
            &right,
            role,
            moderator,
            &deadline_stamp,
        )
        .await
        {
            Ok(_) => created += 1,
            Err(err) => {
                tracing::error!(%err, "scheduling thread creation failed");
                skipped.push(helpers::thread_name(&left.name, &right.name));
            }
        }
    }

    helpers::send_quiet(
        ctx,
        pool,
        format!(
            "Scheduling threads are up! All games must be played by {deadline_stamp}. \
             Post your replays in your thread; your pool moderator is {}.",
            helpers::mention(moderator.get())
        ),
    )
    .await?;

    let summary = if skipped.is_empty() {
        format!("Created {created} scheduling threads in {}.", helpers::mention_channel(pool.get()))
    } else {
        format!(
            "Created {created} scheduling threads in {}; skipped: {}.",
            helpers::mention_channel(pool.get()),
            skipped.join(", ")
        )
    };
    helpers::respond(ctx, cmd, summary, true).await
}

/// Render a raw Unix timestamp as a Discord timestamp tag; anything that
/// doesn't parse is passed through verbatim.
fn format_deadline(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(unix) => format!("<t:{unix}:F>"),
        Err(_) => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_id_lists_accept_mentions_and_bare_ids() {
        let ids = parse_user_ids("<@123> 456 <@789> junk");
        assert_eq!(
            ids,
            vec![UserId::new(123), UserId::new(456), UserId::new(789)]
        );
    }

    #[test]
    fn unix_deadlines_become_timestamp_tags() {
        assert_eq!(format_deadline(" 1735689600 "), "<t:1735689600:F>");
        assert_eq!(format_deadline("Sunday night"), "Sunday night");
    }
}
