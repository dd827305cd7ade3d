//! Discord bot configuration.
//!
//! Loaded once at startup and passed into the bot. There are NO runtime
//! environment variable reads in this crate.

use serenity::model::id::{ChannelId, GuildId};

use crate::error::{DiscordError, Result};

/// Bot credentials and guild wiring.
#[derive(Debug, Clone)]
pub struct DiscordBotConfig {
    /// Discord bot token (required).
    pub bot_token: String,
    /// The guild the slash commands are registered in.
    pub guild_id: GuildId,
    /// Fallback channel for bulk output and diagnostics when a tournament
    /// has no admin channel configured.
    pub bot_log_channel: Option<ChannelId>,
}

impl DiscordBotConfig {
    /// Load bot configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DISCORD_TOKEN` -> bot_token (required)
    /// - `GUILD_ID` -> guild_id (required)
    /// - `BOT_STUFF` -> bot_log_channel
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| DiscordError::Config { name: "DISCORD_TOKEN" })?;

        let guild_id = std::env::var("GUILD_ID")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(GuildId::new)
            .ok_or(DiscordError::Config { name: "GUILD_ID" })?;

        let bot_log_channel = std::env::var("BOT_STUFF")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(ChannelId::new);

        Ok(Self {
            bot_token,
            guild_id,
            bot_log_channel,
        })
    }
}
