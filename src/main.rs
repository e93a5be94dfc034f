mod config;
mod error;
mod handlers;
mod models;
mod router;
mod routers;
mod status;
#[cfg(test)]
mod testing;
mod utils;
mod ws;

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Catalog, Config};
use routers::{DriverRegistry, RouterMap};
use status::{HealthBoard, HealthMonitor};
use utils::SshExecutor;
use ws::Hub;

/// Application state shared across handlers
pub struct AppState {
    pub routers: Arc<RouterMap>,
    pub health: Arc<HealthBoard>,
    pub ws_hub: Option<Arc<Hub>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "looking_glass=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting looking glass {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Config: {}", cfg.catalog_path);
    tracing::info!("Listen: {}", cfg.listen_addr);

    let catalog = Catalog::load(Path::new(&cfg.catalog_path))?;

    // Driver catalog must load completely before any device is bound
    let drivers = DriverRegistry::load(cfg.drivers_dir(&catalog))
        .context("Failed to load router drivers")?;
    tracing::info!("Loaded router drivers: {}", drivers.names().join(", "));

    let executor = Arc::new(SshExecutor::new(cfg.ssh_timeout));
    let routers = Arc::new(RouterMap::build(catalog.devices, &drivers, executor));
    if routers.is_empty() {
        tracing::warn!("No routers configured");
    }

    // Initialize WebSocket hub and health board
    let ws_hub = Arc::new(Hub::new());
    let health = Arc::new(HealthBoard::new(Some(ws_hub.clone())));
    health.register(routers.iter().map(|r| r.name()));

    // Start health monitor
    let shutdown = CancellationToken::new();
    let monitor = HealthMonitor::new(routers.clone(), health.clone(), cfg.health_interval)
        .start(shutdown.clone());

    // Create app state
    let state = Arc::new(AppState {
        routers,
        health,
        ws_hub: Some(ws_hub),
    });

    // Build router
    let app = router::build(state, cfg.request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;
    tracing::info!("Looking glass listening on {}", cfg.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Looking glass shutting down");
    shutdown.cancel();
    if let Err(e) = monitor.await {
        tracing::warn!("Health monitor task failed: {}", e);
    }
    Ok(())
}

/// WebSocket upgrade for health events
pub async fn ws_upgrade_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    if let Some(hub) = &state.ws_hub {
        ws::ws_handler(ws, axum::extract::State(hub.clone())).await
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
