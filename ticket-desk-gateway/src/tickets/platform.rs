//! The chat-platform operations the ticket lifecycle depends on.
//!
//! Production code talks to Discord through [`crate::discord::SerenityPlatform`];
//! tests drive the controller with an in-memory implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};

use crate::transcript::TranscriptMessage;

/// Errors surfaced by a platform implementation.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Discord API error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("Channel {0} not found")]
    ChannelNotFound(ChannelId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Everything needed to create a restricted ticket channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketChannelSpec {
    pub guild_id: GuildId,
    pub category_id: ChannelId,
    pub name: String,
    /// Gets view + send; everyone else in the guild is denied view.
    pub owner: UserId,
    /// Optional staff role that also gets view + send.
    pub staff_role: Option<RoleId>,
}

/// A guild channel found while recovering tickets after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingChannel {
    pub channel_id: ChannelId,
    pub name: String,
    pub parent_id: Option<ChannelId>,
    /// Member granted view access through a permission overwrite, if any.
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// File attached to a log notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAttachment {
    pub path: PathBuf,
    pub filename: String,
}

/// A message for the transcript log channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPost {
    pub content: String,
    pub attachment: Option<LogAttachment>,
}

/// Whether a participant gains or loses access to a ticket channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantAccess {
    Grant,
    Revoke,
}

#[async_trait]
pub trait TicketPlatform: Send + Sync {
    /// Whether `category_id` is a category channel of `guild_id`.
    async fn category_exists(
        &self,
        guild_id: GuildId,
        category_id: ChannelId,
    ) -> Result<bool, PlatformError>;

    async fn create_ticket_channel(
        &self,
        spec: &TicketChannelSpec,
    ) -> Result<ChannelId, PlatformError>;

    /// Post the greeting with the close control and pin it.
    async fn post_control_message(
        &self,
        channel_id: ChannelId,
        owner: UserId,
    ) -> Result<MessageId, PlatformError>;

    async fn disable_close_control(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError>;

    /// Full message history, oldest first.
    async fn fetch_history(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<TranscriptMessage>, PlatformError>;

    async fn send_log(&self, channel_id: ChannelId, post: &LogPost) -> Result<(), PlatformError>;

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError>;

    async fn set_participant_access(
        &self,
        channel_id: ChannelId,
        user: UserId,
        access: ParticipantAccess,
    ) -> Result<(), PlatformError>;

    async fn list_ticket_channels(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<ExistingChannel>, PlatformError>;
}
