pub mod discord;
pub mod server;
pub mod state;
pub mod tickets;
pub mod transcript;

pub use state::AppState;
pub use tickets::{LifecycleError, TicketController, TicketPlatform};
pub use transcript::TranscriptPublisher;
