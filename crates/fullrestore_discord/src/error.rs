//! Error types for the Discord integration.

use fullrestore_api::{ApiError, IdentityError};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for Discord handler operations.
pub type Result<T> = std::result::Result<T, DiscordError>;

#[derive(Debug, Error, Diagnostic)]
pub enum DiscordError {
    /// Backend API failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),

    /// Sign-up reconciliation failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Identity(#[from] IdentityError),

    /// Discord API failure.
    #[error("discord API error: {0}")]
    #[diagnostic(code(fullrestore_discord::serenity))]
    Serenity(#[from] serenity::Error),

    /// No tournament is wired to the channel the command ran in.
    #[error("no tournament found for this channel")]
    #[diagnostic(code(fullrestore_discord::no_tournament))]
    NoTournament,

    /// A required slash command option was absent or of the wrong type.
    /// Should not happen for commands registered by this bot.
    #[error("missing required option: {name}")]
    #[diagnostic(code(fullrestore_discord::missing_option))]
    MissingOption { name: &'static str },

    /// Required environment variable missing or unparseable.
    #[error("invalid or missing environment variable: {name}")]
    #[diagnostic(code(fullrestore_discord::config))]
    Config { name: &'static str },

    /// The failure was already surfaced to the invoking user and the admin
    /// channel; the dispatcher only needs to log it, not apologize again.
    #[error("{0}")]
    #[diagnostic(code(fullrestore_discord::reported))]
    Reported(String),
}
