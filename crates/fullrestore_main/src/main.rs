//! Tournament bot entrypoint: load configuration, wire the backend client
//! into the Discord event handler, and run the gateway.

use fullrestore_api::{ApiClient, ApiConfig};
use fullrestore_discord::{BotContext, DiscordBotConfig, TournamentBot};
use miette::{IntoDiagnostic, Result};
use serenity::all::GatewayIntents;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("fullrestore_api=info,fullrestore_discord=info,fullrestore_main=info,warn")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .init();

    let api_config = ApiConfig::from_env()?;
    let bot_config = DiscordBotConfig::from_env()?;
    info!(base_url = %api_config.base_url, guild = %bot_config.guild_id, "starting");

    let api = ApiClient::new(api_config)?;
    let context = BotContext::new(api, bot_config.clone());

    // Slash commands only; no message content access needed.
    let intents = GatewayIntents::GUILDS;
    let mut client = serenity::Client::builder(&bot_config.bot_token, intents)
        .event_handler(TournamentBot::new(context))
        .await
        .into_diagnostic()?;

    client.start().await.into_diagnostic()?;
    Ok(())
}
