//! Configuration management for ticket-desk.
//!
//! Secrets come from environment variables, settings from a TOML file with
//! environment overrides layered on top.
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `DISCORD_BOT_TOKEN` - Discord bot token (`TOKEN` is accepted too)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/ticket-desk/config.toml`:
//! ```toml
//! [discord]
//! log_channel_id = 123
//! ticket_category_id = 456
//!
//! [tickets]
//! counter_path = "ticket_count.json"
//! start_count = 0
//!
//! [transcripts]
//! dir = "transcripts"
//! public_base_url = "https://example.onrender.com"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ```

mod secrets;
mod settings;

pub use secrets::{Secrets, SecretsError};
pub use settings::{
    DiscordSettings, LoggingSettings, ServerSettings, Settings, SettingsError, TicketSettings,
    TranscriptSettings,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Secrets from environment variables (and `.env`)
    /// 2. Settings from the TOML file (creating defaults if needed)
    /// 3. Environment overrides on top of the settings
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let mut settings = Settings::load()?;
        settings.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(Self { secrets, settings })
    }

    /// Get the Discord bot token.
    pub fn discord_bot_token(&self) -> &str {
        &self.secrets.discord_bot_token
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }

    /// Whether transcript notices are sent anywhere.
    pub fn log_channel(&self) -> Option<u64> {
        self.settings.discord.log_channel()
    }
}
