//! Shared plumbing for command handlers: option extraction, replies,
//! admin-channel escalation, confirmation prompts, and message formatting.

use std::time::Duration;

use fullrestore_api::models::{Entrant, Tournament};
use serenity::builder::{
    CreateActionRow, CreateAllowedMentions, CreateButton, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateMessage,
    EditInteractionResponse,
};
use serenity::client::Context;
use serenity::model::application::{ButtonStyle, CommandDataOption, CommandDataOptionValue, CommandInteraction};
use serenity::model::id::{ChannelId, RoleId, UserId};

use crate::context::BotContext;
use crate::error::{DiscordError, Result};

// ----- option extraction -----

/// The invoked subcommand and its option list, if the command has one.
pub fn subcommand(cmd: &CommandInteraction) -> Option<(&str, &[CommandDataOption])> {
    cmd.data.options.first().and_then(|opt| match &opt.value {
        CommandDataOptionValue::SubCommand(options) => Some((opt.name.as_str(), options.as_slice())),
        _ => None,
    })
}

pub fn opt_str<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_str())
}

pub fn req_str<'a>(options: &'a [CommandDataOption], name: &'static str) -> Result<&'a str> {
    opt_str(options, name).ok_or(DiscordError::MissingOption { name })
}

pub fn opt_i64(options: &[CommandDataOption], name: &str) -> Option<i64> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_i64())
}

pub fn req_i64(options: &[CommandDataOption], name: &'static str) -> Result<i64> {
    opt_i64(options, name).ok_or(DiscordError::MissingOption { name })
}

pub fn req_user(options: &[CommandDataOption], name: &'static str) -> Result<UserId> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_user_id())
        .ok_or(DiscordError::MissingOption { name })
}

pub fn req_channel(options: &[CommandDataOption], name: &'static str) -> Result<ChannelId> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_channel_id())
        .ok_or(DiscordError::MissingOption { name })
}

pub fn req_role(options: &[CommandDataOption], name: &'static str) -> Result<RoleId> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_role_id())
        .ok_or(DiscordError::MissingOption { name })
}

// ----- replies -----

/// Send `content` as the initial reply, or as a follow-up when the
/// interaction has already been acknowledged. Each handler issues exactly
/// one initial reply; everything after that is a follow-up.
pub async fn respond(
    ctx: &Context,
    cmd: &CommandInteraction,
    content: impl Into<String>,
    ephemeral: bool,
) -> Result<()> {
    let content = content.into();
    let initial = CreateInteractionResponseMessage::new()
        .content(content.clone())
        .ephemeral(ephemeral);
    if cmd
        .create_response(&ctx.http, CreateInteractionResponse::Message(initial))
        .await
        .is_ok()
    {
        return Ok(());
    }
    cmd.create_followup(
        &ctx.http,
        CreateInteractionResponseFollowup::new()
            .content(content)
            .ephemeral(ephemeral),
    )
    .await?;
    Ok(())
}

/// Apologize to the invoker and post the full diagnostic to the
/// tournament's admin channel (or the bot log channel as fallback).
/// Best-effort on the Discord side; the returned error carries the detail
/// so the dispatcher logs it without apologizing a second time.
pub async fn escalate(
    ctx: &Context,
    cmd: &CommandInteraction,
    bot: &BotContext,
    tournament: Option<&Tournament>,
    user_message: &str,
    detail: String,
) -> DiscordError {
    tracing::error!(command = %cmd.data.name, %detail, "escalating command failure");
    respond(ctx, cmd, user_message, true).await.ok();

    let admin_channel = tournament
        .and_then(|t| t.admin_snowflake.as_deref())
        .and_then(|s| s.parse::<u64>().ok())
        .map(ChannelId::new)
        .or(bot.config.bot_log_channel);

    match admin_channel {
        Some(channel) => {
            if let Err(err) = channel
                .send_message(&ctx.http, CreateMessage::new().content(detail.clone()))
                .await
            {
                tracing::error!(%err, "failed to reach the admin channel");
            }
        }
        None => tracing::error!("no admin or bot log channel configured for escalation"),
    }

    DiscordError::Reported(detail)
}

/// Post to a channel with all mention parsing suppressed.
pub async fn send_quiet(ctx: &Context, channel: ChannelId, content: impl Into<String>) -> Result<()> {
    channel
        .send_message(
            &ctx.http,
            CreateMessage::new().content(content).allowed_mentions(
                CreateAllowedMentions::new()
                    .everyone(false)
                    .all_users(false)
                    .all_roles(false),
            ),
        )
        .await?;
    Ok(())
}

// ----- confirmation prompt -----

/// Ask the invoker to confirm a destructive action with buttons. Returns
/// `false` on cancel or after 60 seconds without a press. Consumes the
/// initial reply; callers continue with follow-ups.
pub async fn confirm_action(
    ctx: &Context,
    cmd: &CommandInteraction,
    prompt: &str,
    confirm_message: &str,
    cancel_message: &str,
) -> Result<bool> {
    let buttons = CreateActionRow::Buttons(vec![
        CreateButton::new("confirm")
            .label("Confirm")
            .style(ButtonStyle::Success),
        CreateButton::new("cancel")
            .label("Cancel")
            .style(ButtonStyle::Danger),
    ]);
    cmd.create_response(
        &ctx.http,
        CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(prompt)
                .components(vec![buttons])
                .ephemeral(true),
        ),
    )
    .await?;

    let message = cmd.get_response(&ctx.http).await?;
    let Some(press) = message
        .await_component_interaction(&ctx.shard)
        .author_id(cmd.user.id)
        .timeout(Duration::from_secs(60))
        .await
    else {
        cmd.edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .content("Confirmation not received within 1 minute, cancelling.")
                .components(vec![]),
        )
        .await?;
        return Ok(false);
    };

    let confirmed = press.data.custom_id == "confirm";
    let content = if confirmed {
        confirm_message.to_string()
    } else {
        format!("Action canceled: {cancel_message}")
    };
    press
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .components(vec![]),
            ),
        )
        .await?;
    Ok(confirmed)
}

/// Diagnostic posted to the bot log channel when a handler fails without
/// escalating on its own. Keeps the full error out of the user-facing
/// apology.
pub fn failure_report(command: &str, user: &str, err: &DiscordError) -> String {
    format!("`/{command}` from {user} failed: {err}")
}

// ----- tournament lookups -----

fn flatten_not_found(err: fullrestore_api::ApiError) -> DiscordError {
    if err.is_not_found() {
        DiscordError::NoTournament
    } else {
        DiscordError::Api(err)
    }
}

/// Tournament whose sign-up channel is the channel the command ran in.
pub async fn tournament_for_signup_channel(
    bot: &BotContext,
    cmd: &CommandInteraction,
) -> Result<Tournament> {
    bot.api
        .find_tournament_by_signup_channel(&cmd.channel_id.to_string())
        .await
        .map_err(flatten_not_found)
}

/// Tournament whose admin channel is the channel the command ran in.
pub async fn tournament_for_admin_channel(
    bot: &BotContext,
    cmd: &CommandInteraction,
) -> Result<Tournament> {
    bot.api
        .find_tournament_by_admin_channel(&cmd.channel_id.to_string())
        .await
        .map_err(flatten_not_found)
}

/// Tournament owning the scheduling thread the command ran in. Walks
/// thread -> pool channel -> category and matches the category snowflake.
pub async fn tournament_for_thread(
    ctx: &Context,
    bot: &BotContext,
    cmd: &CommandInteraction,
) -> Result<Tournament> {
    let thread = cmd
        .channel_id
        .to_channel(&ctx.http)
        .await?
        .guild()
        .ok_or(DiscordError::NoTournament)?;
    let pool_id = thread.parent_id.ok_or(DiscordError::NoTournament)?;
    let pool = pool_id
        .to_channel(&ctx.http)
        .await?
        .guild()
        .ok_or(DiscordError::NoTournament)?;
    let category = pool.parent_id.ok_or(DiscordError::NoTournament)?;
    bot.api
        .find_tournament_by_thread_category(&category.to_string())
        .await
        .map_err(flatten_not_found)
}

// ----- formatting -----

pub fn mention(user_id: u64) -> String {
    format!("<@{user_id}>")
}

pub fn mention_channel(channel_id: u64) -> String {
    format!("<#{channel_id}>")
}

/// Scheduling thread title for a pairing.
pub fn thread_name(left: &str, right: &str) -> String {
    format!("{left} vs. {right}")
}

/// One line per entrant: a mention when the player is linked to Discord,
/// the Showdown handle otherwise. Chunked so each message stays under the
/// platform's mention ceiling.
pub fn entrant_lines(entrants: &[Entrant], chunk_size: usize) -> Vec<String> {
    entrants
        .chunks(chunk_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|entrant| match entrant.player.discord_id.as_deref() {
                    Some(id) => match id.parse::<u64>() {
                        Ok(id) => mention(id),
                        Err(_) => entrant.player.ps_user.clone(),
                    },
                    None => entrant.player.ps_user.clone(),
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// Public match page for a reported pairing.
pub fn match_page_url(
    format: &str,
    slug: &str,
    round_number: i64,
    left_handle: &str,
    right_handle: &str,
) -> String {
    format!("https://fullrestore.me/match/{format}/{slug}/r{round_number}/{left_handle}-vs-{right_handle}")
}

/// Spoiler-wrapped winner marker pointing at the winning side.
pub fn winner_marker(winner_on_left: bool) -> &'static str {
    if winner_on_left {
        "||\u{2b05}\u{fe0f} \u{1f3c6}||"
    } else {
        "||\u{1f3c6} \u{27a1}\u{fe0f}||"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fullrestore_api::models::Player;
    use pretty_assertions::assert_eq;

    fn entrant(id: i64, ps_user: &str, discord_id: Option<&str>) -> Entrant {
        Entrant {
            id,
            player: Player {
                id,
                ps_user: ps_user.to_string(),
                discord_user: None,
                discord_id: discord_id.map(str::to_string),
            },
        }
    }

    #[test]
    fn entrant_lines_prefer_mentions_and_chunk() {
        let entrants: Vec<Entrant> = (0..5)
            .map(|i| {
                if i == 2 {
                    entrant(i, "unlinked-player", None)
                } else {
                    entrant(i, "someone", Some(&format!("10{i}")))
                }
            })
            .collect();

        let lines = entrant_lines(&entrants, 2);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "<@100>\n<@101>");
        assert_eq!(lines[1], "unlinked-player\n<@103>");
        assert_eq!(lines[2], "<@104>");
    }

    #[test]
    fn entrant_lines_fall_back_on_unparseable_snowflakes() {
        let entrants = vec![entrant(1, "glitchmon", Some("not-a-snowflake"))];
        assert_eq!(entrant_lines(&entrants, 50), vec!["glitchmon".to_string()]);
    }

    #[test]
    fn match_page_url_matches_site_scheme() {
        assert_eq!(
            match_page_url("gen3ou", "adv-revival-2", 4, "bigpuffa", "ashketchum"),
            "https://fullrestore.me/match/gen3ou/adv-revival-2/r4/bigpuffa-vs-ashketchum"
        );
    }

    #[test]
    fn winner_marker_points_at_the_winner() {
        assert!(winner_marker(true).contains('\u{2b05}'));
        assert!(winner_marker(false).contains('\u{27a1}'));
        assert!(winner_marker(true).starts_with("||"));
    }

    #[test]
    fn thread_names_read_like_a_matchup() {
        assert_eq!(thread_name("bigpuffa", "ashketchum"), "bigpuffa vs. ashketchum");
    }

    #[test]
    fn failure_reports_name_the_command_and_the_error() {
        let err = DiscordError::Api(fullrestore_api::ApiError::Status {
            status: 500,
            body: "backend exploded".to_string(),
        });
        let report = failure_report("out", "bigpuffa", &err);
        assert!(report.contains("`/out`"));
        assert!(report.contains("bigpuffa"));
        assert!(report.contains("500"));
    }
}
