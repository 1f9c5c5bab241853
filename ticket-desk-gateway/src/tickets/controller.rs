use std::sync::Arc;
use std::time::Duration;

use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use ticket_desk_core::{
    CounterError, CounterStore, Settings, Ticket, TicketError, TicketNumber, TicketRegistry,
    TicketState, is_ticket_channel,
};
use tracing::{error, info, warn};

use super::platform::{
    LogAttachment, LogPost, ParticipantAccess, PlatformError, TicketChannelSpec, TicketPlatform,
};
use crate::transcript::{TranscriptArtifact, TranscriptContext, TranscriptPublisher};

/// Controller-level errors.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Ticket category is not configured or does not exist")]
    CategoryMissing,

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error("Ticket counter error: {0}")]
    Counter(#[from] CounterError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl LifecycleError {
    /// Text shown to the user who triggered the failing interaction.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CategoryMissing => "Error: Ticket Category ID not found configuration.",
            Self::Ticket(TicketError::AlreadyClosing) => "Ticket is already being closed",
            Self::Ticket(TicketError::NotATicket(_)) => {
                "This command can only be used in ticket channels."
            }
            Self::Ticket(TicketError::InvalidTransition { .. }) => {
                "This ticket can no longer be changed."
            }
            Self::Counter(_) | Self::Platform(_) => "Something went wrong, please try again later.",
        }
    }
}

/// Static knobs the controller needs from the settings file.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub ticket_category: Option<ChannelId>,
    pub log_channel: Option<ChannelId>,
    pub staff_role: Option<RoleId>,
    pub close_delay: Duration,
}

impl From<&Settings> for ControllerSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            ticket_category: settings.discord.ticket_category().map(ChannelId::new),
            log_channel: settings.discord.log_channel().map(ChannelId::new),
            staff_role: settings.discord.staff_role().map(RoleId::new),
            close_delay: Duration::from_secs(settings.tickets.close_delay_seconds),
        }
    }
}

/// Result of a successful open.
#[derive(Debug, Clone)]
pub struct OpenedTicket {
    pub ticket: Ticket,
    pub channel_id: ChannelId,
    pub control_message: MessageId,
}

/// Input for the second half of the close sequence.
#[derive(Debug, Clone)]
pub struct CloseRequest {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub closed_by: UserId,
    /// Message carrying the close control, when known.
    pub control_message: Option<MessageId>,
}

/// What a completed close produced.
#[derive(Debug, Clone)]
pub struct CloseReport {
    pub ticket: Ticket,
    pub transcript: Option<TranscriptArtifact>,
    pub log_sent: bool,
}

/// Drives tickets from open to deletion.
pub struct TicketController {
    platform: Arc<dyn TicketPlatform>,
    counter: Arc<CounterStore>,
    registry: TicketRegistry,
    publisher: TranscriptPublisher,
    settings: ControllerSettings,
}

impl TicketController {
    pub fn new(
        platform: Arc<dyn TicketPlatform>,
        counter: Arc<CounterStore>,
        publisher: TranscriptPublisher,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            platform,
            counter,
            registry: TicketRegistry::new(),
            publisher,
            settings,
        }
    }

    pub fn registry(&self) -> &TicketRegistry {
        &self.registry
    }

    pub fn counter(&self) -> &CounterStore {
        &self.counter
    }

    /// Open a ticket for `owner`.
    ///
    /// The category is validated before a number is allocated, so a missing
    /// category leaves no trace.
    pub async fn open_ticket(
        &self,
        guild_id: GuildId,
        owner: UserId,
    ) -> Result<OpenedTicket, LifecycleError> {
        let category_id = self
            .settings
            .ticket_category
            .ok_or(LifecycleError::CategoryMissing)?;
        if !self
            .platform
            .category_exists(guild_id, category_id)
            .await?
        {
            warn!(
                guild_id = guild_id.get(),
                category_id = category_id.get(),
                "Ticket category not found in guild"
            );
            return Err(LifecycleError::CategoryMissing);
        }

        let number = TicketNumber(self.counter.next_number().await?);
        let spec = TicketChannelSpec {
            guild_id,
            category_id,
            name: number.channel_name(),
            owner,
            staff_role: self.settings.staff_role,
        };

        let channel_id = self.platform.create_ticket_channel(&spec).await?;
        let ticket = Ticket::open(number, guild_id.get(), channel_id.get(), owner.get());
        self.registry.insert(ticket.clone());

        let control_message = match self.platform.post_control_message(channel_id, owner).await {
            Ok(message_id) => message_id,
            Err(e) => {
                // A ticket without its close control can never be closed.
                self.registry.remove(channel_id.get());
                if let Err(cleanup) = self.platform.delete_channel(channel_id).await {
                    warn!(
                        channel_id = channel_id.get(),
                        "Failed to remove ticket channel without control message: {}", cleanup
                    );
                }
                error!(
                    ticket = number.0,
                    channel_id = channel_id.get(),
                    "Failed to post ticket control message: {}", e
                );
                return Err(e.into());
            }
        };

        info!(
            ticket = number.0,
            channel_id = channel_id.get(),
            owner = owner.get(),
            "Ticket opened"
        );

        Ok(OpenedTicket {
            ticket,
            channel_id,
            control_message,
        })
    }

    /// First half of closing: the `Open -> Closing` transition.
    ///
    /// Returns `AlreadyClosing` on a repeated attempt. Channels that follow the
    /// naming convention but are unknown to the registry are attached first.
    pub fn begin_close(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        channel_name: &str,
    ) -> Result<Ticket, LifecycleError> {
        let fallback = Ticket::recovered(
            guild_id.get(),
            channel_id.get(),
            channel_name,
            None,
            chrono::Utc::now(),
        );
        let ticket = self.registry.begin_close(channel_id.get(), fallback)?;
        info!(
            ticket = ticket.number.0,
            channel_id = channel_id.get(),
            "Ticket closing"
        );
        Ok(ticket)
    }

    /// Second half of closing: transcript, log notice, grace delay, deletion.
    ///
    /// Transcript and log failures are logged and skipped; only a failed
    /// channel deletion is returned as an error.
    pub async fn finish_close(&self, request: CloseRequest) -> Result<CloseReport, LifecycleError> {
        if let Some(message_id) = request.control_message
            && let Err(e) = self
                .platform
                .disable_close_control(request.channel_id, message_id)
                .await
        {
            warn!(
                channel_id = request.channel_id.get(),
                "Failed to disable close control: {}", e
            );
        }

        let transcript = self.publish_transcript(&request).await;

        let mut log_sent = false;
        if let (Some(log_channel), Some(artifact)) = (self.settings.log_channel, &transcript) {
            let post = self.log_post(&request, artifact);
            match self.platform.send_log(log_channel, &post).await {
                Ok(()) => log_sent = true,
                Err(e) => warn!(
                    channel_id = request.channel_id.get(),
                    "Failed to send transcript log: {}", e
                ),
            }
        }

        if !self.settings.close_delay.is_zero() {
            tokio::time::sleep(self.settings.close_delay).await;
        }

        let snapshot = self.registry.get(request.channel_id.get());

        if let Err(e) = self.platform.delete_channel(request.channel_id).await {
            error!(
                channel_id = request.channel_id.get(),
                "Failed to delete ticket channel: {}", e
            );
            return Err(e.into());
        }

        let ticket = match self.registry.mark_deleted(request.channel_id.get()) {
            Ok(ticket) => ticket,
            // The channel delete event can beat us to the registry.
            Err(e @ TicketError::NotATicket(_)) => match snapshot {
                Some(mut ticket) => {
                    ticket.state = TicketState::Deleted;
                    ticket
                }
                None => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        };
        info!(
            ticket = ticket.number.0,
            channel_id = request.channel_id.get(),
            transcript = transcript.is_some(),
            log_sent,
            "Ticket deleted"
        );

        Ok(CloseReport {
            ticket,
            transcript,
            log_sent,
        })
    }

    /// Administrative counter override.
    pub async fn set_ticket_counter(&self, count: i64) -> Result<(), LifecycleError> {
        self.counter.set_count(count).await?;
        info!(count, "Ticket counter overridden");
        Ok(())
    }

    pub async fn add_participant(
        &self,
        channel_id: ChannelId,
        channel_name: &str,
        user: UserId,
    ) -> Result<(), LifecycleError> {
        self.update_participant(channel_id, channel_name, user, ParticipantAccess::Grant)
            .await
    }

    pub async fn remove_participant(
        &self,
        channel_id: ChannelId,
        channel_name: &str,
        user: UserId,
    ) -> Result<(), LifecycleError> {
        self.update_participant(channel_id, channel_name, user, ParticipantAccess::Revoke)
            .await
    }

    /// Grant or revoke a participant's access to a ticket channel.
    pub async fn update_participant(
        &self,
        channel_id: ChannelId,
        channel_name: &str,
        user: UserId,
        access: ParticipantAccess,
    ) -> Result<(), LifecycleError> {
        if !is_ticket_channel(channel_name) {
            return Err(TicketError::NotATicket(channel_id.get()).into());
        }

        self.platform
            .set_participant_access(channel_id, user, access)
            .await?;
        info!(
            channel_id = channel_id.get(),
            user = user.get(),
            ?access,
            "Ticket participant updated"
        );
        Ok(())
    }

    /// Drop a ticket whose channel was deleted outside the close flow.
    pub fn forget_channel(&self, channel_id: ChannelId) -> Option<Ticket> {
        let ticket = self.registry.remove(channel_id.get())?;
        info!(
            ticket = ticket.number.0,
            channel_id = channel_id.get(),
            state = ticket.state.as_str(),
            "Ticket channel deleted"
        );
        Some(ticket)
    }

    /// Re-attach ticket channels that survived a restart.
    ///
    /// The counter is raised to the highest recovered number so new tickets
    /// never reuse an existing channel name.
    pub async fn recover(&self, guild_id: GuildId) -> Result<usize, LifecycleError> {
        let channels = self.platform.list_ticket_channels(guild_id).await?;

        let discovered: Vec<Ticket> = channels
            .into_iter()
            .filter(|channel| match self.settings.ticket_category {
                Some(category) => channel.parent_id == Some(category),
                None => true,
            })
            .filter_map(|channel| {
                Ticket::recovered(
                    guild_id.get(),
                    channel.channel_id.get(),
                    &channel.name,
                    channel.owner.map(UserId::get),
                    channel.created_at,
                )
            })
            .collect();

        let highest = discovered.iter().map(|t| t.number.0).max();
        let attached = self.registry.recover(discovered);

        if let Some(highest) = highest
            && self.counter.raise_to(highest).await?
        {
            warn!(
                highest,
                "Existing ticket channel was numbered above the stored counter; counter raised"
            );
        }

        info!(guild_id = guild_id.get(), attached, "Recovered ticket channels");
        Ok(attached)
    }

    async fn publish_transcript(&self, request: &CloseRequest) -> Option<TranscriptArtifact> {
        let history = match self.platform.fetch_history(request.channel_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    channel_id = request.channel_id.get(),
                    "Failed to fetch ticket history: {}", e
                );
                return None;
            }
        };

        let context = TranscriptContext {
            guild_id: request.guild_id.get(),
            channel_id: request.channel_id.get(),
            channel_name: request.channel_name.clone(),
            closed_by: request.closed_by.get(),
        };
        self.publisher.publish(&context, &history).await
    }

    fn log_post(&self, request: &CloseRequest, artifact: &TranscriptArtifact) -> LogPost {
        let mut content = format!(
            "📝 **Transcript Log**\nTicket: {}\nClosed by: <@{}>",
            request.channel_name, request.closed_by
        );

        match &artifact.url {
            Some(url) => {
                content.push_str(&format!("\nTranscript: {}", url));
                LogPost {
                    content,
                    attachment: None,
                }
            }
            None => LogPost {
                content,
                attachment: Some(LogAttachment {
                    path: artifact.path.clone(),
                    filename: format!("transcript-{}.html", request.channel_name),
                }),
            },
        }
    }
}
