use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;
use crate::transcript::TRANSCRIPTS_ROUTE;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tickets_open: usize,
    pub uptime_seconds: i64,
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler));

    if state.serve_transcripts {
        router = router.nest_service(TRANSCRIPTS_ROUTE, ServeDir::new(&state.transcripts_dir));
    }

    router
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Liveness probe for uptime pingers.
async fn root_handler() -> &'static str {
    "Bot is running!"
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tickets_open: state.open_ticket_count(),
        uptime_seconds: state.uptime_seconds(),
    })
}
