use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_desk_core::{Config, CounterStore};
use ticket_desk_gateway::discord::{SerenityPlatform, start_discord_bot};
use ticket_desk_gateway::server;
use ticket_desk_gateway::state::AppState;
use ticket_desk_gateway::tickets::{ControllerSettings, TicketController};
use ticket_desk_gateway::transcript::TranscriptPublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first so the log level can come from it
    let config = Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Configuration loaded (log channel: {:?}, ticket category: {:?})",
        config.log_channel(),
        config.settings.discord.ticket_category()
    );
    if config.settings.discord.ticket_category().is_none() {
        tracing::warn!("No ticket category configured; opening tickets will fail");
    }

    let counter = Arc::new(CounterStore::new(
        config.settings.tickets.counter_path.clone(),
        config.settings.tickets.start_count,
    ));
    info!(
        "Ticket counter at {} ({})",
        counter.get_count().await,
        counter.path().display()
    );

    let publisher = TranscriptPublisher::from_settings(&config.settings.transcripts);
    if publisher.is_hosted() {
        info!("Transcripts will be linked from the log channel");
    }

    let platform = Arc::new(SerenityPlatform::from_token(config.discord_bot_token()));
    let controller = Arc::new(TicketController::new(
        platform,
        counter,
        publisher,
        ControllerSettings::from(&config.settings),
    ));

    let state = Arc::new(AppState::new(
        controller,
        config.settings.transcripts.dir.clone(),
        config.settings.transcripts.serve,
    ));

    // Start the Discord client in the background
    let mut client = start_discord_bot(config.discord_bot_token(), Arc::clone(&state)).await?;
    info!("Discord bot started");
    let discord_task = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            tracing::error!("Discord client error: {}", e);
        }
    });

    // Start the HTTP server
    let bind_addr = config.bind_addr();
    info!("Starting liveness server on {}", bind_addr);

    // Run server (this blocks)
    let server_result = server::run(state, &bind_addr).await;

    // If we get here, the server stopped
    discord_task.abort();

    server_result
}
