use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::{
    CreateAttachment, CreateChannel, CreateMessage, EditMessage, GetMessages,
};
use serenity::http::Http;
use serenity::model::channel::{
    Channel, ChannelType, Message, PermissionOverwrite, PermissionOverwriteType,
};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use serenity::model::Timestamp;
use ticket_desk_core::TicketNumber;
use tracing::{debug, warn};

use super::components::{close_control_row, ticket_embed};
use crate::tickets::{
    ExistingChannel, LogPost, ParticipantAccess, PlatformError, TicketChannelSpec, TicketPlatform,
};
use crate::transcript::{TranscriptAttachment, TranscriptEmbed, TranscriptMessage};

/// Discord's page size for message history requests.
const HISTORY_PAGE: u8 = 100;

fn participant_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::ATTACH_FILES
}

/// [`TicketPlatform`] backed by the Discord REST API.
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// REST-only client; the gateway connection is owned by the serenity `Client`.
    pub fn from_token(token: &str) -> Self {
        Self::new(Arc::new(Http::new(token)))
    }
}

fn to_utc(timestamp: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}

fn to_transcript_message(message: &Message) -> TranscriptMessage {
    TranscriptMessage {
        id: message.id.get(),
        author_id: message.author.id.get(),
        author_name: message
            .author
            .global_name
            .clone()
            .unwrap_or_else(|| message.author.name.clone()),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        timestamp: to_utc(message.timestamp),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| TranscriptAttachment {
                filename: attachment.filename.clone(),
                url: attachment.url.clone(),
            })
            .collect(),
        embeds: message
            .embeds
            .iter()
            .map(|embed| TranscriptEmbed {
                title: embed.title.clone(),
                description: embed.description.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl TicketPlatform for SerenityPlatform {
    async fn category_exists(
        &self,
        guild_id: GuildId,
        category_id: ChannelId,
    ) -> Result<bool, PlatformError> {
        match category_id.to_channel(&self.http).await {
            Ok(Channel::Guild(channel)) => {
                Ok(channel.guild_id == guild_id && channel.kind == ChannelType::Category)
            }
            Ok(_) => Ok(false),
            Err(e) => {
                warn!(
                    category_id = category_id.get(),
                    "Ticket category lookup failed: {}", e
                );
                Ok(false)
            }
        }
    }

    async fn create_ticket_channel(
        &self,
        spec: &TicketChannelSpec,
    ) -> Result<ChannelId, PlatformError> {
        let mut overwrites = vec![
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                // The @everyone role shares the guild's id.
                kind: PermissionOverwriteType::Role(RoleId::new(spec.guild_id.get())),
            },
            PermissionOverwrite {
                allow: participant_permissions(),
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(spec.owner),
            },
        ];
        if let Some(staff_role) = spec.staff_role {
            overwrites.push(PermissionOverwrite {
                allow: participant_permissions(),
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(staff_role),
            });
        }

        let builder = CreateChannel::new(spec.name.clone())
            .kind(ChannelType::Text)
            .category(spec.category_id)
            .permissions(overwrites);

        let channel = spec.guild_id.create_channel(&self.http, builder).await?;
        Ok(channel.id)
    }

    async fn post_control_message(
        &self,
        channel_id: ChannelId,
        owner: UserId,
    ) -> Result<MessageId, PlatformError> {
        let message = channel_id
            .send_message(
                &self.http,
                CreateMessage::new()
                    .content(format!("<@{}>", owner))
                    .embed(ticket_embed())
                    .components(vec![close_control_row(false)]),
            )
            .await?;

        if let Err(e) = message.pin(&self.http).await {
            warn!(
                channel_id = channel_id.get(),
                "Failed to pin ticket control message: {}", e
            );
        }

        Ok(message.id)
    }

    async fn disable_close_control(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        channel_id
            .edit_message(
                &self.http,
                message_id,
                EditMessage::new().components(vec![close_control_row(true)]),
            )
            .await?;
        Ok(())
    }

    async fn fetch_history(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<TranscriptMessage>, PlatformError> {
        let mut history = Vec::new();
        let mut before: Option<MessageId> = None;

        loop {
            let mut request = GetMessages::new().limit(HISTORY_PAGE);
            if let Some(id) = before {
                request = request.before(id);
            }

            // Pages come back newest first.
            let page = channel_id.messages(&self.http, request).await?;
            let fetched = page.len();
            before = page.last().map(|message| message.id);
            history.extend(page.iter().map(to_transcript_message));

            if fetched < usize::from(HISTORY_PAGE) {
                break;
            }
        }

        history.reverse();
        debug!(
            channel_id = channel_id.get(),
            messages = history.len(),
            "Fetched ticket history"
        );
        Ok(history)
    }

    async fn send_log(&self, channel_id: ChannelId, post: &LogPost) -> Result<(), PlatformError> {
        let mut message = CreateMessage::new().content(post.content.clone());
        if let Some(attachment) = &post.attachment {
            let bytes = tokio::fs::read(&attachment.path).await?;
            message = message.add_file(CreateAttachment::bytes(bytes, attachment.filename.clone()));
        }

        channel_id.send_message(&self.http, message).await?;
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError> {
        channel_id.delete(&self.http).await?;
        Ok(())
    }

    async fn set_participant_access(
        &self,
        channel_id: ChannelId,
        user: UserId,
        access: ParticipantAccess,
    ) -> Result<(), PlatformError> {
        match access {
            ParticipantAccess::Grant => {
                channel_id
                    .create_permission(
                        &self.http,
                        PermissionOverwrite {
                            allow: participant_permissions(),
                            deny: Permissions::empty(),
                            kind: PermissionOverwriteType::Member(user),
                        },
                    )
                    .await?
            }
            ParticipantAccess::Revoke => {
                channel_id
                    .delete_permission(&self.http, PermissionOverwriteType::Member(user))
                    .await?
            }
        }
        Ok(())
    }

    async fn list_ticket_channels(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<ExistingChannel>, PlatformError> {
        let channels = guild_id.channels(&self.http).await?;

        Ok(channels
            .into_values()
            .filter(|channel| channel.kind == ChannelType::Text)
            .filter(|channel| TicketNumber::parse_channel_name(&channel.name).is_some())
            .map(|channel| {
                let owner = channel
                    .permission_overwrites
                    .iter()
                    .find_map(|overwrite| match overwrite.kind {
                        PermissionOverwriteType::Member(user)
                            if overwrite.allow.contains(Permissions::VIEW_CHANNEL) =>
                        {
                            Some(user)
                        }
                        _ => None,
                    });
                ExistingChannel {
                    channel_id: channel.id,
                    name: channel.name.clone(),
                    parent_id: channel.parent_id,
                    owner,
                    created_at: to_utc(channel.id.created_at()),
                }
            })
            .collect())
    }
}
