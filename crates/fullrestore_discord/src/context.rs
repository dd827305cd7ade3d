//! Shared handler context.
//!
//! Every command handler receives the backend client and bot configuration
//! through this context instead of module-level globals, so handlers stay
//! testable and the wiring is visible at the call site.

use fullrestore_api::ApiClient;

use crate::config::DiscordBotConfig;

/// Capabilities available to every command handler.
#[derive(Debug, Clone)]
pub struct BotContext {
    /// Typed client for the tournament backend.
    pub api: ApiClient,
    /// Guild wiring and fallback channels.
    pub config: DiscordBotConfig,
}

impl BotContext {
    pub fn new(api: ApiClient, config: DiscordBotConfig) -> Self {
        Self { api, config }
    }
}
