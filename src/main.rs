//! Orderly - conversational order-taking assistant
//!
//! A Rust backend that walks a customer through a guided conversation,
//! hands free-text orders to an external interpretation service and
//! records their confirmation.

mod api;
mod menu;
mod order_service;
mod runtime;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use menu::MenuCatalog;
use order_service::{HttpOrderService, LoggingService, ServiceConfig};
use runtime::{SessionManager, DEFAULT_IDLE_TIMEOUT};
use state_machine::RevealTiming;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderly=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("ORDERLY_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let defaults = RevealTiming::default();
    let timing = RevealTiming {
        standard: env_millis("ORDERLY_REVEAL_DELAY_MS").unwrap_or(defaults.standard),
        short: env_millis("ORDERLY_SHORT_REVEAL_DELAY_MS").unwrap_or(defaults.short),
    };

    let service_config = ServiceConfig::from_env()?;
    tracing::info!(
        interpret_url = %service_config.interpret_url(),
        confirm_url = %service_config.confirm_url(),
        timeout_secs = service_config.timeout.as_secs(),
        "Order service configured"
    );

    // One client serves both interpret and confirm
    let service = Arc::new(LoggingService::new(HttpOrderService::new(&service_config)?));

    let catalog = Arc::new(MenuCatalog::default());
    tracing::info!(items = catalog.items().len(), "Menu loaded");

    // Create application state
    let idle_timeout = std::env::var("ORDERLY_SESSION_IDLE_SECS")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_secs);
    tracing::info!(idle_secs = idle_timeout.as_secs(), "Session idle timeout");

    let manager = SessionManager::new(Arc::clone(&service), service, catalog, timing)
        .with_idle_timeout(idle_timeout);
    let state = AppState::new(manager);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Orderly server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn env_millis(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(name, value = %raw, "Ignoring invalid delay");
            None
        }
    }
}
