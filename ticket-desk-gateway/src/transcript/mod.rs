//! Transcript rendering and publishing.
//!
//! A closed ticket's history is rendered to HTML, stored under
//! `<dir>/<guild_id>/`, and optionally exposed through a public URL served by
//! the liveness server.

mod render;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ticket_desk_core::TranscriptSettings;
use tracing::{info, warn};

pub use render::HtmlTranscriptRenderer;

/// URL path prefix transcripts are served under.
pub const TRANSCRIPTS_ROUTE: &str = "/transcripts";

/// One message of a ticket's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptMessage {
    pub id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<TranscriptAttachment>,
    pub embeds: Vec<TranscriptEmbed>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptAttachment {
    pub filename: String,
    pub url: String,
}

impl TranscriptAttachment {
    pub fn is_image(&self) -> bool {
        let lower = self.filename.to_ascii_lowercase();
        [".png", ".jpg", ".jpeg", ".gif", ".webp"]
            .iter()
            .any(|ext| lower.ends_with(ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Identifies the ticket a transcript belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptContext {
    pub guild_id: u64,
    pub channel_id: u64,
    pub channel_name: String,
    pub closed_by: u64,
}

/// A stored transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptArtifact {
    pub path: PathBuf,
    pub file_name: String,
    /// Present when a public base URL is configured.
    pub url: Option<String>,
}

/// Writes transcripts to disk and builds their public URLs.
#[derive(Debug, Clone)]
pub struct TranscriptPublisher {
    dir: PathBuf,
    public_base_url: Option<String>,
    renderer: HtmlTranscriptRenderer,
}

impl TranscriptPublisher {
    pub fn new(
        dir: impl Into<PathBuf>,
        public_base_url: Option<String>,
        renderer: HtmlTranscriptRenderer,
    ) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
            renderer,
        }
    }

    pub fn from_settings(settings: &TranscriptSettings) -> Self {
        Self::new(
            settings.dir.clone(),
            settings.public_base_url().map(str::to_string),
            HtmlTranscriptRenderer::new(settings.offset()),
        )
    }

    /// Whether log notices should link instead of attach.
    pub fn is_hosted(&self) -> bool {
        self.public_base_url.is_some()
    }

    /// Render and store a transcript.
    ///
    /// Returns `None` when there is nothing to render or the file could not
    /// be written; callers carry on with the close either way.
    pub async fn publish(
        &self,
        context: &TranscriptContext,
        messages: &[TranscriptMessage],
    ) -> Option<TranscriptArtifact> {
        let Some(html) = self.renderer.render(context, messages) else {
            warn!(
                channel_id = context.channel_id,
                "Transcript render produced nothing"
            );
            return None;
        };

        let guild_dir = self.dir.join(context.guild_id.to_string());
        if let Err(e) = tokio::fs::create_dir_all(&guild_dir).await {
            warn!("Failed to create transcript directory {:?}: {}", guild_dir, e);
            return None;
        }

        let file_name = transcript_file_name(context);
        let path = guild_dir.join(&file_name);
        if let Err(e) = tokio::fs::write(&path, html).await {
            warn!("Failed to write transcript {:?}: {}", path, e);
            return None;
        }

        let url = self.public_base_url.as_ref().map(|base| {
            format!(
                "{}{}/{}/{}",
                base, TRANSCRIPTS_ROUTE, context.guild_id, file_name
            )
        });

        info!(
            channel_id = context.channel_id,
            path = %path.display(),
            "Transcript stored"
        );

        Some(TranscriptArtifact {
            path,
            file_name,
            url,
        })
    }
}

/// `<channel_name>-<channel_id>-<token>.html`; the random token keeps hosted
/// transcripts from being guessed from channel ids.
fn transcript_file_name(context: &TranscriptContext) -> String {
    format!(
        "{}-{}-{}.html",
        context.channel_name,
        context.channel_id,
        uuid::Uuid::new_v4().simple()
    )
}
