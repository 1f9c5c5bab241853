//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/ticket-desk/config.toml), plus the
//! environment overrides that hosting platforms expect to set directly.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# ticket-desk configuration file
# Located at: ~/.config/ticket-desk/config.toml
#
# This file contains non-sensitive configuration.
# The bot token is loaded from the environment:
#   - DISCORD_BOT_TOKEN (or TOKEN)
#
# Every id below can also be overridden from the environment:
#   LOG_CHANNEL_ID, TICKET_CATEGORY_ID, STAFF_ROLE_ID, PUBLIC_URL,
#   TICKET_START_COUNT, TICKET_COUNTER_PATH, TRANSCRIPTS_DIR, PORT

[discord]
# Channel that receives transcript notices (0 or unset disables them)
log_channel_id = 0
# Category under which ticket channels are created (required to open tickets)
ticket_category_id = 0
# Optional role that can see every ticket
# staff_role_id = 0

[tickets]
counter_path = "ticket_count.json"
start_count = 0
close_delay_seconds = 3

[transcripts]
dir = "transcripts"
serve = true
utc_offset = "+07:00"
# public_base_url = "https://example.onrender.com"

[server]
host = "0.0.0.0"
port = 8080

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Discord ids the bot works with
    #[serde(default)]
    pub discord: DiscordSettings,

    /// Ticket numbering and lifecycle
    #[serde(default)]
    pub tickets: TicketSettings,

    /// Transcript storage and hosting
    #[serde(default)]
    pub transcripts: TranscriptSettings,

    /// Liveness HTTP server
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Discord ids. Zero is accepted and means "not configured".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_channel_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_category_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_role_id: Option<u64>,
}

impl DiscordSettings {
    pub fn log_channel(&self) -> Option<u64> {
        self.log_channel_id.filter(|id| *id != 0)
    }

    pub fn ticket_category(&self) -> Option<u64> {
        self.ticket_category_id.filter(|id| *id != 0)
    }

    pub fn staff_role(&self) -> Option<u64> {
        self.staff_role_id.filter(|id| *id != 0)
    }
}

/// Ticket settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketSettings {
    /// JSON file holding `{ "count": n }`
    #[serde(default = "default_counter_path")]
    pub counter_path: PathBuf,

    /// Counter value assumed when nothing is persisted yet
    #[serde(default)]
    pub start_count: i64,

    /// Seconds between the transcript notice and channel deletion
    #[serde(default = "default_close_delay_seconds")]
    pub close_delay_seconds: u64,
}

/// Transcript settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptSettings {
    /// Directory transcripts are written to (one sub-directory per guild)
    #[serde(default = "default_transcripts_dir")]
    pub dir: PathBuf,

    /// Public base URL; when set, log notices link to the hosted file
    /// instead of attaching it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    /// Serve the transcript directory from the liveness server
    #[serde(default = "default_true")]
    pub serve: bool,

    /// UTC offset used for message timestamps, e.g. "+07:00"
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl TranscriptSettings {
    /// Parsed timestamp offset. Falls back to UTC when unparseable.
    pub fn offset(&self) -> FixedOffset {
        match self.utc_offset.parse::<FixedOffset>() {
            Ok(offset) => offset,
            Err(e) => {
                tracing::warn!(
                    "Invalid transcripts.utc_offset '{}' ({}), using UTC",
                    self.utc_offset,
                    e
                );
                Utc.fix()
            }
        }
    }

    /// Base URL with blank values treated as unset.
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Liveness server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_counter_path() -> PathBuf {
    PathBuf::from("ticket_count.json")
}

fn default_close_delay_seconds() -> u64 {
    3
}

fn default_transcripts_dir() -> PathBuf {
    PathBuf::from("transcripts")
}

fn default_true() -> bool {
    true
}

fn default_utc_offset() -> String {
    "+07:00".to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            counter_path: default_counter_path(),
            start_count: 0,
            close_delay_seconds: default_close_delay_seconds(),
        }
    }
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            dir: default_transcripts_dir(),
            public_base_url: None,
            serve: true,
            utc_offset: default_utc_offset(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// `TICKET_DESK_CONFIG_DIR` wins over the XDG config directory.
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("TICKET_DESK_CONFIG_DIR") {
            return Ok(PathBuf::from(override_dir).join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("ticket-desk");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Apply the environment-level overrides hosting dashboards set.
    ///
    /// Numeric values that fail to parse are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(id) = get("LOG_CHANNEL_ID").and_then(|v| parse_override("LOG_CHANNEL_ID", &v)) {
            self.discord.log_channel_id = Some(id);
        }
        if let Some(id) =
            get("TICKET_CATEGORY_ID").and_then(|v| parse_override("TICKET_CATEGORY_ID", &v))
        {
            self.discord.ticket_category_id = Some(id);
        }
        if let Some(id) = get("STAFF_ROLE_ID").and_then(|v| parse_override("STAFF_ROLE_ID", &v)) {
            self.discord.staff_role_id = Some(id);
        }
        if let Some(url) = get("PUBLIC_URL") {
            self.transcripts.public_base_url = Some(url);
        }
        if let Some(count) =
            get("TICKET_START_COUNT").and_then(|v| parse_override("TICKET_START_COUNT", &v))
        {
            self.tickets.start_count = count;
        }
        if let Some(path) = get("TICKET_COUNTER_PATH") {
            self.tickets.counter_path = PathBuf::from(path);
        }
        if let Some(dir) = get("TRANSCRIPTS_DIR") {
            self.transcripts.dir = PathBuf::from(dir);
        }
        if let Some(port) = get("PORT").and_then(|v| parse_override("PORT", &v)) {
            self.server.port = port;
        }
    }

    /// Get the HTTP bind address for the liveness server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring {}: '{}' is not a valid number", key, value);
            None
        }
    }
}
