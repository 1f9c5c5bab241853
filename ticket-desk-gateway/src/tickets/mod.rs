//! Ticket lifecycle: open, close, participants, and restart recovery.

mod controller;
pub mod platform;

pub use controller::{
    CloseReport, CloseRequest, ControllerSettings, LifecycleError, OpenedTicket, TicketController,
};
pub use platform::{
    ExistingChannel, LogAttachment, LogPost, ParticipantAccess, PlatformError, TicketChannelSpec,
    TicketPlatform,
};
