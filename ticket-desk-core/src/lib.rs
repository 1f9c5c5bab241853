pub mod config;
pub mod counter;
pub mod registry;
pub mod ticket;

// Config re-exports
pub use config::{
    Config, ConfigError, DiscordSettings, LoggingSettings, Secrets, SecretsError, ServerSettings,
    Settings, SettingsError, TicketSettings, TranscriptSettings,
};

pub use counter::{CounterError, CounterStore};
pub use registry::TicketRegistry;
pub use ticket::{Ticket, TicketError, TicketEvent, TicketNumber, TicketState, is_ticket_channel};
