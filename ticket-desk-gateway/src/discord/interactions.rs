use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage,
    EditInteractionResponse,
};
use serenity::model::application::{CommandInteraction, ComponentInteraction, Interaction};
use serenity::model::id::{ChannelId, UserId};
use serenity::prelude::*;
use ticket_desk_core::TicketNumber;
use tracing::{error, warn};

use super::bot::Bot;
use super::components::{
    CLOSE_BUTTON_ID, OPEN_BUTTON_ID, TicketCommand, open_panel_row, panel_embed,
};
use crate::tickets::{CloseRequest, ParticipantAccess};

const GUILD_ONLY: &str = "This can only be used inside a server.";

fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

async fn channel_name(ctx: &Context, channel_id: ChannelId) -> Option<String> {
    match channel_id.to_channel(&ctx.http).await {
        Ok(channel) => channel.guild().map(|channel| channel.name),
        Err(e) => {
            warn!(
                channel_id = channel_id.get(),
                "Failed to resolve channel: {}", e
            );
            None
        }
    }
}

impl Bot {
    pub(super) async fn handle_interaction(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Component(component) => match component.data.custom_id.as_str() {
                OPEN_BUTTON_ID => self.handle_open(&ctx, &component).await,
                CLOSE_BUTTON_ID => self.handle_close(&ctx, &component).await,
                other => warn!(custom_id = other, "Unknown component interaction"),
            },
            Interaction::Command(command) => {
                match TicketCommand::from_name(&command.data.name) {
                    Some(TicketCommand::Panel) => self.handle_panel(&ctx, &command).await,
                    Some(TicketCommand::SetTicket) => {
                        self.handle_set_ticket(&ctx, &command).await
                    }
                    Some(TicketCommand::Add) => {
                        self.handle_participant(&ctx, &command, ParticipantAccess::Grant)
                            .await
                    }
                    Some(TicketCommand::Remove) => {
                        self.handle_participant(&ctx, &command, ParticipantAccess::Revoke)
                            .await
                    }
                    None => warn!(command = %command.data.name, "Unknown slash command"),
                }
            }
            _ => {}
        }
    }

    async fn handle_open(&self, ctx: &Context, component: &ComponentInteraction) {
        let Some(guild_id) = component.guild_id else {
            let _ = component
                .create_response(&ctx.http, ephemeral(GUILD_ONLY))
                .await;
            return;
        };

        // Channel creation can outlast the interaction response window.
        let defer = CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(true),
        );
        if let Err(e) = component.create_response(&ctx.http, defer).await {
            error!("Failed to acknowledge open interaction: {}", e);
            return;
        }

        let content = match self
            .state
            .controller
            .open_ticket(guild_id, component.user.id)
            .await
        {
            Ok(opened) => format!("Ticket created: <#{}>", opened.channel_id),
            Err(e) => {
                warn!(
                    guild_id = guild_id.get(),
                    user = component.user.id.get(),
                    "Failed to open ticket: {}", e
                );
                e.user_message().to_string()
            }
        };

        let _ = component
            .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
            .await;
    }

    async fn handle_close(&self, ctx: &Context, component: &ComponentInteraction) {
        let Some(guild_id) = component.guild_id else {
            let _ = component
                .create_response(&ctx.http, ephemeral(GUILD_ONLY))
                .await;
            return;
        };

        let name = match channel_name(ctx, component.channel_id).await {
            Some(name) => name,
            None => component.channel_id.get().to_string(),
        };

        if let Err(e) = self
            .state
            .controller
            .begin_close(guild_id, component.channel_id, &name)
        {
            let _ = component
                .create_response(&ctx.http, ephemeral(e.user_message()))
                .await;
            return;
        }

        let _ = component
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content("Closing ticket, generating transcript..."),
                ),
            )
            .await;

        let request = CloseRequest {
            guild_id,
            channel_id: component.channel_id,
            channel_name: name,
            closed_by: component.user.id,
            control_message: Some(component.message.id),
        };
        if let Err(e) = self.state.controller.finish_close(request).await {
            error!(
                channel_id = component.channel_id.get(),
                "Ticket close did not complete: {}", e
            );
        }
    }

    fn is_admin(command: &CommandInteraction) -> bool {
        command
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|permissions| permissions.administrator())
    }

    async fn handle_panel(&self, ctx: &Context, command: &CommandInteraction) {
        if !Self::is_admin(command) {
            let _ = command
                .create_response(&ctx.http, ephemeral("No permission"))
                .await;
            return;
        }

        let panel = CreateMessage::new()
            .embed(panel_embed())
            .components(vec![open_panel_row()]);
        let reply = match command.channel_id.send_message(&ctx.http, panel).await {
            Ok(_) => "Panel created",
            Err(e) => {
                error!(
                    channel_id = command.channel_id.get(),
                    "Failed to post ticket panel: {}", e
                );
                "Something went wrong, please try again later."
            }
        };

        let _ = command.create_response(&ctx.http, ephemeral(reply)).await;
    }

    async fn handle_set_ticket(&self, ctx: &Context, command: &CommandInteraction) {
        if !Self::is_admin(command) {
            let _ = command
                .create_response(&ctx.http, ephemeral("No permission"))
                .await;
            return;
        }

        let Some(count) = command
            .data
            .options
            .iter()
            .find(|option| option.name == "number")
            .and_then(|option| option.value.as_i64())
        else {
            let _ = command
                .create_response(&ctx.http, ephemeral("Missing ticket number"))
                .await;
            return;
        };

        let reply = match self.state.controller.set_ticket_counter(count).await {
            Ok(()) => format!(
                "Ticket counter set to {}. The next ticket will be {}.",
                count,
                TicketNumber(count.saturating_add(1)).channel_name()
            ),
            Err(e) => {
                error!(count, "Failed to set ticket counter: {}", e);
                e.user_message().to_string()
            }
        };

        let _ = command.create_response(&ctx.http, ephemeral(reply)).await;
    }

    async fn handle_participant(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        access: ParticipantAccess,
    ) {
        let Some(user) = command
            .data
            .options
            .iter()
            .find(|option| option.name == "user")
            .and_then(|option| option.value.as_user_id())
        else {
            let _ = command
                .create_response(&ctx.http, ephemeral("Missing user"))
                .await;
            return;
        };

        let name = channel_name(ctx, command.channel_id)
            .await
            .unwrap_or_default();
        let controller = &self.state.controller;
        let result = match access {
            ParticipantAccess::Grant => {
                controller
                    .add_participant(command.channel_id, &name, user)
                    .await
            }
            ParticipantAccess::Revoke => {
                controller
                    .remove_participant(command.channel_id, &name, user)
                    .await
            }
        };

        let reply = match result {
            Ok(()) => participant_notice(access, user),
            Err(e) => {
                warn!(
                    channel_id = command.channel_id.get(),
                    user = user.get(),
                    "Failed to update ticket participant: {}", e
                );
                e.user_message().to_string()
            }
        };

        let _ = command.create_response(&ctx.http, ephemeral(reply)).await;
    }
}

fn participant_notice(access: ParticipantAccess, user: UserId) -> String {
    match access {
        ParticipantAccess::Grant => format!("Added <@{}> to this ticket.", user),
        ParticipantAccess::Revoke => format!("Removed <@{}> from this ticket.", user),
    }
}
