use std::sync::Arc;

use serenity::async_trait;
use serenity::model::application::{Command, Interaction};
use serenity::model::channel::{GuildChannel, Message};
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info, warn};

use super::components::slash_commands;
use crate::state::AppState;

/// Discord event handler.
///
/// Ticket logic lives in [`crate::tickets::TicketController`]; this type only
/// translates gateway events into controller calls.
pub struct Bot {
    pub(super) state: Arc<AppState>,
}

impl Bot {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        self.handle_interaction(ctx, interaction).await;
    }

    /// Channels removed by hand (or by our own close) leave the registry.
    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        self.state.controller.forget_channel(channel.id);
    }

    /// Bot is ready: register slash commands and re-attach surviving tickets.
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);

        if let Err(e) = Command::set_global_commands(&ctx.http, slash_commands()).await {
            error!("Failed to register slash commands: {}", e);
        }

        for guild in &ready.guilds {
            if let Err(e) = self.state.controller.recover(guild.id).await {
                warn!(
                    guild_id = guild.id.get(),
                    "Failed to recover ticket channels: {}", e
                );
            }
        }
    }
}
