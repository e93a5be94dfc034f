use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::status::{ServingStatus, SERVICE_NAME};
use crate::AppState;

use super::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: ServingStatus,
    pub services: BTreeMap<String, ServingStatus>,
}

#[derive(Serialize)]
pub struct ServiceHealthResponse {
    pub service: String,
    pub status: ServingStatus,
}

/// Overall status plus every device
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let services = state.health.snapshot();
    let status = services
        .get(SERVICE_NAME)
        .copied()
        .unwrap_or(ServingStatus::Unknown);
    Json(HealthResponse { status, services })
}

/// Status of one service, e.g. `lookingglass/edge1`
pub async fn get_service_health(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Json<ServiceHealthResponse>, ApiError> {
    if let Some(device) = service.strip_prefix(&format!("{}/", SERVICE_NAME)) {
        if state.routers.get_by_name(device).is_none() {
            return Err(ApiError::not_found("router"));
        }
    }
    let status = state
        .health
        .status(&service)
        .ok_or_else(|| ApiError::not_found("service"))?;
    Ok(Json(ServiceHealthResponse { service, status }))
}
