#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Offset, TimeZone, Utc};
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use ticket_desk_core::CounterStore;
use ticket_desk_gateway::tickets::{
    ControllerSettings, ExistingChannel, LogPost, ParticipantAccess, PlatformError,
    TicketChannelSpec, TicketController, TicketPlatform,
};
use ticket_desk_gateway::transcript::{
    HtmlTranscriptRenderer, TranscriptMessage, TranscriptPublisher,
};

pub const GUILD: GuildId = GuildId::new(900);
pub const CATEGORY: ChannelId = ChannelId::new(800);
pub const LOG_CHANNEL: ChannelId = ChannelId::new(700);
pub const OWNER: UserId = UserId::new(42);
pub const STAFF: UserId = UserId::new(43);

/// In-memory Discord stand-in that records every call.
#[derive(Default)]
pub struct FakePlatform {
    next_id: AtomicU64,
    pub category_present: Mutex<bool>,
    pub history_fails: Mutex<bool>,
    pub delete_fails: Mutex<bool>,
    pub post_fails: Mutex<bool>,
    pub history: Mutex<Vec<TranscriptMessage>>,
    pub existing: Mutex<Vec<ExistingChannel>>,
    pub created: Mutex<Vec<(ChannelId, TicketChannelSpec)>>,
    pub control_messages: Mutex<Vec<(ChannelId, UserId)>>,
    pub disabled_controls: Mutex<Vec<(ChannelId, MessageId)>>,
    pub logs: Mutex<Vec<(ChannelId, LogPost)>>,
    pub deleted: Mutex<Vec<ChannelId>>,
    pub access_changes: Mutex<Vec<(ChannelId, UserId, ParticipantAccess)>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let platform = Self {
            next_id: AtomicU64::new(10_000),
            ..Default::default()
        };
        *platform.category_present.lock().unwrap() = true;
        *platform.history.lock().unwrap() = vec![message(1, "alice", "my order never arrived")];
        platform
    }

    pub fn without_category() -> Self {
        let platform = Self::new();
        *platform.category_present.lock().unwrap() = false;
        platform
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, spec)| spec.name.clone())
            .collect()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketPlatform for FakePlatform {
    async fn category_exists(
        &self,
        _guild_id: GuildId,
        category_id: ChannelId,
    ) -> Result<bool, PlatformError> {
        Ok(*self.category_present.lock().unwrap() && category_id == CATEGORY)
    }

    async fn create_ticket_channel(
        &self,
        spec: &TicketChannelSpec,
    ) -> Result<ChannelId, PlatformError> {
        let channel_id = ChannelId::new(self.allocate_id());
        self.created
            .lock()
            .unwrap()
            .push((channel_id, spec.clone()));
        Ok(channel_id)
    }

    async fn post_control_message(
        &self,
        channel_id: ChannelId,
        owner: UserId,
    ) -> Result<MessageId, PlatformError> {
        if *self.post_fails.lock().unwrap() {
            return Err(PlatformError::Other("missing send permission".to_string()));
        }
        self.control_messages
            .lock()
            .unwrap()
            .push((channel_id, owner));
        Ok(MessageId::new(self.allocate_id()))
    }

    async fn disable_close_control(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.disabled_controls
            .lock()
            .unwrap()
            .push((channel_id, message_id));
        Ok(())
    }

    async fn fetch_history(
        &self,
        _channel_id: ChannelId,
    ) -> Result<Vec<TranscriptMessage>, PlatformError> {
        if *self.history_fails.lock().unwrap() {
            return Err(PlatformError::Other("history unavailable".to_string()));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn send_log(&self, channel_id: ChannelId, post: &LogPost) -> Result<(), PlatformError> {
        self.logs.lock().unwrap().push((channel_id, post.clone()));
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError> {
        if *self.delete_fails.lock().unwrap() {
            return Err(PlatformError::ChannelNotFound(channel_id));
        }
        self.deleted.lock().unwrap().push(channel_id);
        Ok(())
    }

    async fn set_participant_access(
        &self,
        channel_id: ChannelId,
        user: UserId,
        access: ParticipantAccess,
    ) -> Result<(), PlatformError> {
        self.access_changes
            .lock()
            .unwrap()
            .push((channel_id, user, access));
        Ok(())
    }

    async fn list_ticket_channels(
        &self,
        _guild_id: GuildId,
    ) -> Result<Vec<ExistingChannel>, PlatformError> {
        Ok(self.existing.lock().unwrap().clone())
    }
}

pub fn message(id: u64, author: &str, content: &str) -> TranscriptMessage {
    TranscriptMessage {
        id,
        author_id: OWNER.get(),
        author_name: author.to_string(),
        author_is_bot: false,
        content: content.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        attachments: Vec::new(),
        embeds: Vec::new(),
    }
}

pub fn settings() -> ControllerSettings {
    ControllerSettings {
        ticket_category: Some(CATEGORY),
        log_channel: Some(LOG_CHANNEL),
        staff_role: None,
        close_delay: Duration::ZERO,
    }
}

pub fn publisher(dir: &Path, public_base_url: Option<&str>) -> TranscriptPublisher {
    TranscriptPublisher::new(
        dir.join("transcripts"),
        public_base_url.map(str::to_string),
        HtmlTranscriptRenderer::new(Utc.fix()),
    )
}

pub struct Harness {
    pub platform: Arc<FakePlatform>,
    pub controller: Arc<TicketController>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(platform: FakePlatform) -> Self {
        Self::with(platform, settings(), None)
    }

    pub fn with(
        platform: FakePlatform,
        settings: ControllerSettings,
        public_base_url: Option<&str>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(platform);
        let counter = Arc::new(CounterStore::new(dir.path().join("ticket_count.json"), 0));
        let controller = Arc::new(TicketController::new(
            platform.clone(),
            counter,
            publisher(dir.path(), public_base_url),
            settings,
        ));
        Self {
            platform,
            controller,
            dir,
        }
    }

    pub fn counter_path(&self) -> std::path::PathBuf {
        self.dir.path().join("ticket_count.json")
    }
}
