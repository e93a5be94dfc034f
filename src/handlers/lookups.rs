use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::LgError;
use crate::models::*;
use crate::routers::{Query, RouterInstance};
use crate::utils::{sanitize_aspath, IpNet};
use crate::AppState;

use super::ApiError;

fn router(state: &AppState, id: i64) -> Result<&Arc<RouterInstance>, ApiError> {
    state
        .routers
        .get_by_ordinal(id)
        .ok_or_else(|| LgError::UnknownDevice.into())
}

async fn run(router: &RouterInstance, query: Query<'_>) -> Result<Json<LookupResponse>, ApiError> {
    tracing::info!("{} on {}", query.operation(), router.name());
    let outputs = router.run(&query).await?;
    Ok(Json(LookupResponse::from_outputs(outputs)))
}

/// Ping a target from a router
pub async fn ping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let router = router(&state, id)?;
    let ip = IpNet::resolve(&req.target).await?;
    run(router, Query::Ping(&ip)).await
}

/// Traceroute to a target from a router
pub async fn traceroute(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let router = router(&state, id)?;
    let ip = IpNet::resolve(&req.target).await?;
    run(router, Query::Traceroute(&ip)).await
}

/// Look up the BGP route for an address or prefix
pub async fn bgp_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let router = router(&state, id)?;
    let ip = IpNet::resolve(&req.target).await?;
    run(router, Query::BgpRoute(&ip)).await
}

/// Routes tagged with a community
pub async fn bgp_community(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<CommunityRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let router = router(&state, id)?;
    run(router, Query::BgpCommunity(&req.community)).await
}

/// Routes whose AS path matches a pattern
pub async fn bgp_aspath(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<AsPathRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let router = router(&state, id)?;
    let aspath = sanitize_aspath(&req.pattern)?;
    run(router, Query::BgpAsPath(&aspath)).await
}
