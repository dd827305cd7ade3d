//! `/tournament`: tournament bootstrap.

use fullrestore_api::models::NewTournament;
use serenity::builder::CreateInteractionResponseFollowup;
use serenity::client::Context;
use serenity::model::application::{CommandDataOption, CommandInteraction};

use crate::context::BotContext;
use crate::error::Result;
use crate::helpers;

pub async fn run(ctx: &Context, bot: &BotContext, cmd: &CommandInteraction) -> Result<()> {
    let Some((sub, options)) = helpers::subcommand(cmd) else {
        return helpers::respond(ctx, cmd, "Unknown subcommand.", true).await;
    };

    match sub {
        "init" => init(ctx, bot, cmd, options).await,
        _ => helpers::respond(ctx, cmd, "Unknown subcommand.", true).await,
    }
}

async fn init(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
    options: &[CommandDataOption],
) -> Result<()> {
    let name = helpers::req_str(options, "name")?.to_string();
    let format = helpers::req_str(options, "format")?.to_string();
    let season = helpers::req_i64(options, "season")?;
    let best_of = helpers::req_i64(options, "best-of")?;
    let elimination = helpers::req_i64(options, "elimination")?;
    let start_date = helpers::req_str(options, "start-date")?.to_string();
    let finish_date = helpers::opt_str(options, "finish-date").map(str::to_string);
    let signup_start_date = helpers::opt_str(options, "signup-start-date").map(str::to_string);
    let signup_finish_date = helpers::opt_str(options, "signup-finish-date").map(str::to_string);
    let info = helpers::opt_str(options, "info").map(str::to_string);

    let tournament = NewTournament {
        name: name.clone(),
        season,
        format,
        start_date,
        finish_date,
        team_tour: false,
        info,
        // A best-of-N set is won at ceil(N / 2) games.
        winner_first_to: best_of / 2 + 1,
        elimination,
        signup_start_date,
        signup_finish_date,
    };
    let created = match bot.api.create_tournament(&tournament).await {
        Ok(created) => created,
        Err(err) if err.is_conflict() => {
            return helpers::respond(
                ctx,
                cmd,
                format!("A tournament named '{name}' already exists."),
                true,
            )
            .await;
        }
        Err(err) => {
            return Err(helpers::escalate(
                ctx,
                cmd,
                bot,
                None,
                "Could not create the tournament, see the log channel.",
                format!("Tournament creation failed for '{name}': {err}"),
            )
            .await);
        }
    };

    helpers::respond(
        ctx,
        cmd,
        format!(
            "Tournament '{}' created: slug `{}`, format {}.",
            created.name, created.slug, created.format
        ),
        false,
    )
    .await?;
    cmd.create_followup(
        &ctx.http,
        CreateInteractionResponseFollowup::new()
            .content(
                "Wire up the sign-up, admin, and results channels plus the entrant role on the \
                 website so the channel-scoped commands start working.",
            )
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
