mod bot;
pub mod components;
mod interactions;
mod platform;

use std::sync::Arc;

use serenity::prelude::*;
use tracing::info;

pub use bot::Bot;
pub use platform::SerenityPlatform;

use crate::state::AppState;

/// Build the Discord client. Call `start()` on the result to connect.
pub async fn start_discord_bot(token: &str, state: Arc<AppState>) -> Result<Client, DiscordError> {
    info!("Starting Discord bot...");

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let bot = Bot::new(state);

    Client::builder(token, intents)
        .event_handler(bot)
        .await
        .map_err(|e| DiscordError::ClientError(e.to_string()))
}

/// Discord-related errors
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("Failed to create Discord client: {0}")]
    ClientError(String),
}
