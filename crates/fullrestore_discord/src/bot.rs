//! Gateway event handler: registers the guild's slash commands on ready and
//! dispatches interactions to the command modules.

use serenity::async_trait;
use serenity::builder::CreateMessage;
use serenity::client::{Context, EventHandler};
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;

use crate::commands;
use crate::context::BotContext;
use crate::error::DiscordError;
use crate::helpers;
use crate::slash_commands;

pub struct TournamentBot {
    bot: BotContext,
}

impl TournamentBot {
    pub fn new(bot: BotContext) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl EventHandler for TournamentBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(bot = %ready.user.name, "connected to discord");
        match self
            .bot
            .config
            .guild_id
            .set_commands(&ctx.http, slash_commands::create_commands())
            .await
        {
            Ok(commands) => tracing::info!(count = commands.len(), "slash commands registered"),
            Err(err) => tracing::error!(%err, "failed to register slash commands"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(cmd) = interaction else {
            return;
        };
        tracing::debug!(command = %cmd.data.name, user = %cmd.user.name, "dispatching");

        let result = match cmd.data.name.as_str() {
            "in" => commands::signup::run(&ctx, &self.bot, &cmd).await,
            "out" => commands::withdraw::run(&ctx, &self.bot, &cmd).await,
            "player" => commands::player::run(&ctx, &self.bot, &cmd).await,
            "round" => commands::round::run(&ctx, &self.bot, &cmd).await,
            "pairing" => commands::pairing::run(&ctx, &self.bot, &cmd).await,
            "match" => commands::match_report::run(&ctx, &self.bot, &cmd).await,
            "tournament" => commands::tournament::run(&ctx, &self.bot, &cmd).await,
            other => {
                tracing::warn!(command = other, "unknown command");
                return;
            }
        };

        match result {
            Ok(()) => {}
            // Already surfaced to the user and the admin channel.
            Err(DiscordError::Reported(detail)) => {
                tracing::error!(command = %cmd.data.name, %detail, "command failed");
            }
            Err(err) => {
                tracing::error!(command = %cmd.data.name, %err, "command failed");
                helpers::respond(
                    &ctx,
                    &cmd,
                    "Something went wrong running that command.",
                    true,
                )
                .await
                .ok();
                if let Some(channel) = self.bot.config.bot_log_channel {
                    let report = helpers::failure_report(&cmd.data.name, &cmd.user.name, &err);
                    channel
                        .send_message(&ctx.http, CreateMessage::new().content(report))
                        .await
                        .ok();
                }
            }
        }
    }
}
