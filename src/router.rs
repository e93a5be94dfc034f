use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/info", get(handlers::routers::get_info))
        .route("/api/routers", get(handlers::routers::list_routers))
        // Lookups
        .route("/api/routers/:id/ping", post(handlers::lookups::ping))
        .route("/api/routers/:id/traceroute", post(handlers::lookups::traceroute))
        .route("/api/routers/:id/bgp/route", post(handlers::lookups::bgp_route))
        .route("/api/routers/:id/bgp/community", post(handlers::lookups::bgp_community))
        .route("/api/routers/:id/bgp/aspath", post(handlers::lookups::bgp_aspath))
        // Health
        .route("/api/health", get(handlers::health::get_health))
        .route("/api/health/*service", get(handlers::health::get_service_health))
        // WebSocket route
        .route("/api/ws", get(crate::ws_upgrade_handler))
        // Add state and middleware
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
