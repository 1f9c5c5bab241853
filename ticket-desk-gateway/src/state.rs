use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::tickets::TicketController;

/// Shared state for the Discord handler and the HTTP server.
pub struct AppState {
    pub controller: Arc<TicketController>,
    /// Root directory transcripts are written to and served from.
    pub transcripts_dir: PathBuf,
    pub serve_transcripts: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        controller: Arc<TicketController>,
        transcripts_dir: impl Into<PathBuf>,
        serve_transcripts: bool,
    ) -> Self {
        Self {
            controller,
            transcripts_dir: transcripts_dir.into(),
            serve_transcripts,
            started_at: Utc::now(),
        }
    }

    pub fn open_ticket_count(&self) -> usize {
        self.controller.registry().open_tickets().len()
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
