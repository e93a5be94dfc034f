use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

/// Identify this instance
pub async fn get_info() -> Json<InfoResponse> {
    let hostname = match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!("Failed to read hostname: {}", e);
            "unknown".to_string()
        }
    };
    Json(InfoResponse {
        hostname,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List routers one page at a time
pub async fn list_routers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRoutersQuery>,
) -> Json<ListRoutersResponse> {
    let (page, next_page) = state.routers.list(query.limit, query.page_token);
    let routers = page
        .into_iter()
        .map(|(id, router)| RouterSummary {
            id,
            name: router.name().to_string(),
            location: router.config().location.clone(),
            health: router.health(),
        })
        .collect();
    Json(ListRoutersResponse { routers, next_page })
}

#[cfg(test)]
mod tests {
    use crate::testing::{app, get_json, ScriptedExecutor};
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_info() {
        let (app, _) = app(&[], Arc::new(ScriptedExecutor::default()));
        let (status, body) = get_json(app, "/api/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["hostname"].is_string());
    }

    #[tokio::test]
    async fn test_list_pages_with_global_ids() {
        let devices = [("r1", "frrouting"), ("r2", "eos"), ("r3", "nxos")];
        let (app, _) = app(&devices, Arc::new(ScriptedExecutor::default()));

        let (status, body) = get_json(app.clone(), "/api/routers?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["routers"].as_array().unwrap().len(), 2);
        assert_eq!(body["next_page"], 2);
        assert_eq!(body["routers"][0]["health"]["timestamp"], serde_json::Value::Null);

        let (_, body) = get_json(app, "/api/routers?limit=2&page_token=2").await;
        assert_eq!(body["routers"][0]["id"], 3);
        assert_eq!(body["routers"][0]["name"], "r3");
        assert_eq!(body["routers"][0]["location"], "Lab");
        assert!(body.get("next_page").is_none());
    }

    #[tokio::test]
    async fn test_list_past_end_is_empty() {
        let (app, _) = app(&[("r1", "frrouting")], Arc::new(ScriptedExecutor::default()));
        let (status, body) = get_json(app, "/api/routers?page_token=9").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["routers"].as_array().unwrap().is_empty());
        assert!(body.get("next_page").is_none());
    }
}
