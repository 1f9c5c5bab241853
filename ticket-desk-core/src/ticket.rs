//! Ticket numbering, channel naming, and the per-ticket state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix shared by every ticket channel name.
pub const TICKET_CHANNEL_PREFIX: &str = "ticket-";

/// Sequential ticket number as issued by the counter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketNumber(pub i64);

impl TicketNumber {
    /// Channel name for this ticket, zero padded to four digits.
    pub fn channel_name(self) -> String {
        format!("{}{:04}", TICKET_CHANNEL_PREFIX, self.0)
    }

    /// Parse a channel name produced by [`TicketNumber::channel_name`].
    ///
    /// Accepts `ticket-<digits>` and, for counters set below zero,
    /// `ticket--<digits>`.
    pub fn parse_channel_name(name: &str) -> Option<Self> {
        let number = name.strip_prefix(TICKET_CHANNEL_PREFIX)?;
        let digits = number.strip_prefix('-').unwrap_or(number);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        number.parse().ok().map(Self)
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:04}", self.0)
    }
}

/// Whether a channel follows the ticket naming convention.
///
/// This is the loose check used to gate participant commands.
pub fn is_ticket_channel(name: &str) -> bool {
    name.starts_with(TICKET_CHANNEL_PREFIX)
}

/// Lifecycle state of a ticket channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Open,
    Closing,
    /// Terminal.
    Deleted,
}

impl TicketState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Deleted => "deleted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Apply `event`, returning the next state.
    pub fn apply(self, event: TicketEvent) -> Result<Self, TicketError> {
        match (self, event) {
            (Self::Open, TicketEvent::Close) => Ok(Self::Closing),
            (Self::Closing, TicketEvent::Close) => Err(TicketError::AlreadyClosing),
            (Self::Closing, TicketEvent::Delete) => Ok(Self::Deleted),
            (from, event) => Err(TicketError::InvalidTransition { from, event }),
        }
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that drive a ticket through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketEvent {
    /// The close control was used.
    Close,
    /// The channel was deleted after the close sequence.
    Delete,
}

impl fmt::Display for TicketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Close => f.write_str("close"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Ticket state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket is already being closed")]
    AlreadyClosing,

    #[error("Cannot {event} a ticket that is {from}")]
    InvalidTransition { from: TicketState, event: TicketEvent },

    #[error("Channel {0} is not a ticket")]
    NotATicket(u64),
}

/// One private support conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub number: TicketNumber,
    pub guild_id: u64,
    pub channel_id: u64,
    /// Unknown for tickets recovered from channels without a member overwrite.
    pub owner_id: Option<u64>,
    pub opened_at: DateTime<Utc>,
    pub state: TicketState,
}

impl Ticket {
    /// A freshly opened ticket.
    pub fn open(number: TicketNumber, guild_id: u64, channel_id: u64, owner_id: u64) -> Self {
        Self {
            number,
            guild_id,
            channel_id,
            owner_id: Some(owner_id),
            opened_at: Utc::now(),
            state: TicketState::Open,
        }
    }

    /// A ticket re-derived from an existing channel name.
    pub fn recovered(
        guild_id: u64,
        channel_id: u64,
        channel_name: &str,
        owner_id: Option<u64>,
        opened_at: DateTime<Utc>,
    ) -> Option<Self> {
        let number = TicketNumber::parse_channel_name(channel_name)?;
        Some(Self {
            number,
            guild_id,
            channel_id,
            owner_id,
            opened_at,
            state: TicketState::Open,
        })
    }

    pub fn channel_name(&self) -> String {
        self.number.channel_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_is_zero_padded() {
        assert_eq!(TicketNumber(1).channel_name(), "ticket-0001");
        assert_eq!(TicketNumber(42).channel_name(), "ticket-0042");
        assert_eq!(TicketNumber(1222).channel_name(), "ticket-1222");
        assert_eq!(TicketNumber(12345).channel_name(), "ticket-12345");
    }

    #[test]
    fn parse_channel_name_accepts_convention_only() {
        assert_eq!(
            TicketNumber::parse_channel_name("ticket-0007"),
            Some(TicketNumber(7))
        );
        assert_eq!(
            TicketNumber::parse_channel_name("ticket-12345"),
            Some(TicketNumber(12345))
        );
        assert_eq!(TicketNumber::parse_channel_name("ticket-"), None);
        assert_eq!(TicketNumber::parse_channel_name("ticket-abc"), None);
        assert_eq!(TicketNumber::parse_channel_name("ticket--"), None);
        assert_eq!(TicketNumber::parse_channel_name("ticket---1"), None);
        assert_eq!(TicketNumber::parse_channel_name("ticket-+1"), None);
        assert_eq!(TicketNumber::parse_channel_name("general"), None);
    }

    #[test]
    fn negative_numbers_roundtrip_through_channel_name() {
        let number = TicketNumber(-4);
        assert_eq!(number.channel_name(), "ticket--004");
        assert_eq!(
            TicketNumber::parse_channel_name(&number.channel_name()),
            Some(number)
        );
        for n in [-12345, -1, 0, 1, 9999] {
            let number = TicketNumber(n);
            assert_eq!(
                TicketNumber::parse_channel_name(&number.channel_name()),
                Some(number)
            );
        }
    }

    #[test]
    fn is_ticket_channel_uses_prefix() {
        assert!(is_ticket_channel("ticket-0001"));
        assert!(is_ticket_channel("ticket-archive"));
        assert!(!is_ticket_channel("tickets"));
        assert!(!is_ticket_channel("support"));
    }

    #[test]
    fn state_machine_happy_path() {
        let state = TicketState::Open.apply(TicketEvent::Close).unwrap();
        assert_eq!(state, TicketState::Closing);
        let state = state.apply(TicketEvent::Delete).unwrap();
        assert_eq!(state, TicketState::Deleted);
        assert!(state.is_terminal());
    }

    #[test]
    fn double_close_is_rejected() {
        assert_eq!(
            TicketState::Closing.apply(TicketEvent::Close),
            Err(TicketError::AlreadyClosing)
        );
    }

    #[test]
    fn invalid_transitions_are_reported() {
        assert_eq!(
            TicketState::Open.apply(TicketEvent::Delete),
            Err(TicketError::InvalidTransition {
                from: TicketState::Open,
                event: TicketEvent::Delete,
            })
        );
        assert!(TicketState::Deleted.apply(TicketEvent::Close).is_err());
        assert!(TicketState::Deleted.apply(TicketEvent::Delete).is_err());
    }

    #[test]
    fn recovered_ticket_requires_conventional_name() {
        let now = Utc::now();
        let ticket = Ticket::recovered(1, 2, "ticket-0010", Some(3), now).unwrap();
        assert_eq!(ticket.number, TicketNumber(10));
        assert_eq!(ticket.state, TicketState::Open);
        assert!(Ticket::recovered(1, 2, "general", None, now).is_none());
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(
            TicketError::AlreadyClosing.to_string(),
            "Ticket is already being closed"
        );
        let err = TicketError::InvalidTransition {
            from: TicketState::Open,
            event: TicketEvent::Delete,
        };
        assert_eq!(err.to_string(), "Cannot delete a ticket that is open");
    }
}
