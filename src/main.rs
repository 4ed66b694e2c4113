//! pairlink-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints, then
//! restores persisted sessions in the background.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pairlink_gateway::api;
use pairlink_gateway::app_state::AppState;
use pairlink_gateway::auth::TokenVerifier;
use pairlink_gateway::config::GatewayConfig;
use pairlink_gateway::domain::{EventBus, SessionRegistry};
use pairlink_gateway::engine::ProtocolEngine;
use pairlink_gateway::engine::simulated::SimulatedEngine;
use pairlink_gateway::msglog::TracingMessageLog;
use pairlink_gateway::pairing::Base64PairingEncoder;
use pairlink_gateway::store::fs_store::FsCredentialStore;
use pairlink_gateway::supervisor::{ConnectionSupervisor, ReconnectPolicy};
use pairlink_gateway::ws::{ObserverBindings, ws_handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting pairlink-gateway");

    // Build domain layer
    let registry = Arc::new(SessionRegistry::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build supervision layer. The simulated engine stands in until a
    // real protocol engine is linked in.
    let store = Arc::new(FsCredentialStore::new(config.credentials_dir.clone()));
    let engine: Arc<dyn ProtocolEngine> = Arc::new(SimulatedEngine::default());
    let supervisor = Arc::new(ConnectionSupervisor::new(
        registry,
        event_bus,
        store,
        engine,
        Arc::new(Base64PairingEncoder),
        Arc::new(TracingMessageLog),
        ReconnectPolicy {
            base_delay: config.reconnect_base_delay,
            max_attempts: config.reconnect_max_attempts,
        },
    ));

    // Build application state
    let app_state = AppState {
        supervisor: Arc::clone(&supervisor),
        bindings: Arc::new(ObserverBindings::new()),
        verifier: TokenVerifier::new(&config.jwt_secret),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    // Restore persisted sessions once the server is accepting traffic.
    let restorer = Arc::clone(&supervisor);
    tokio::spawn(async move {
        restorer.restore_sessions().await;
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&supervisor)))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C, then closes every live connection without logging
/// tenants out so credentials survive the restart.
async fn shutdown_signal(supervisor: Arc<ConnectionSupervisor>) {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("shutdown signal listener failed");
        return;
    }
    tracing::info!("shutdown signal received; closing connections");
    supervisor.shutdown_all().await;
}
