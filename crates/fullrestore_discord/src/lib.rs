//! Discord front end for the tournament backend.
//!
//! Slash commands are the only surface: sign-ups and withdrawals in a
//! tournament's sign-up channel, admin operations in its admin channel, and
//! match reporting inside scheduling threads. All durable state lives in
//! the backend; this crate holds no storage of its own.

pub mod bot;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod slash_commands;
pub mod threads;

pub use bot::TournamentBot;
pub use config::DiscordBotConfig;
pub use context::BotContext;
pub use error::{DiscordError, Result};

pub mod prelude {
    pub use crate::bot::TournamentBot;
    pub use crate::config::DiscordBotConfig;
    pub use crate::context::BotContext;
    pub use crate::error::{DiscordError, Result};
}
