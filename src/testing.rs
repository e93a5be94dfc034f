//! Test doubles shared across module tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::error::{LgError, LgResult};
use crate::models::RouterConfig;
use crate::routers::{DriverRegistry, RouterMap};
use crate::status::HealthBoard;
use crate::utils::{IpNet, RemoteExecutor};
use crate::AppState;

/// RemoteExecutor that records every batch and replays queued results.
///
/// With nothing queued, a batch succeeds with one empty output per command.
#[derive(Default)]
pub struct ScriptedExecutor {
    results: Mutex<VecDeque<LgResult<Vec<String>>>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn push_ok(&self, outputs: Vec<String>) {
        self.results.lock().push_back(Ok(outputs));
    }

    pub fn push_err(&self, err: LgError) {
        self.results.lock().push_back(Err(err));
    }

    /// Command batches in the order they were executed
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedExecutor {
    async fn execute(&self, _router: &RouterConfig, commands: &[String]) -> LgResult<Vec<String>> {
        self.batches.lock().push(commands.to_vec());
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![String::new(); commands.len()]))
    }
}

/// Executor whose health depends on the device name, for monitor tests
#[derive(Default)]
pub struct SwitchableExecutor {
    down: Mutex<HashSet<String>>,
}

impl SwitchableExecutor {
    pub fn set_down(&self, device: &str, down: bool) {
        let mut set = self.down.lock();
        if down {
            set.insert(device.to_string());
        } else {
            set.remove(device);
        }
    }
}

#[async_trait]
impl RemoteExecutor for SwitchableExecutor {
    async fn execute(&self, router: &RouterConfig, commands: &[String]) -> LgResult<Vec<String>> {
        if self.down.lock().contains(&router.name) {
            return Err(LgError::ConnectionFailed(format!("{} unreachable", router.name)));
        }
        Ok(vec![String::new(); commands.len()])
    }
}

/// Application router over the given `(name, type)` devices
pub fn app(
    devices: &[(&str, &str)],
    executor: Arc<dyn RemoteExecutor>,
) -> (axum::Router, Arc<AppState>) {
    let drivers = DriverRegistry::load(None).expect("bundled drivers");
    let configs = devices
        .iter()
        .map(|(name, driver)| RouterConfig {
            name: name.to_string(),
            hostname: format!("{}.example.net:22", name),
            username: "lg".into(),
            password: "secret".into(),
            location: "Lab".into(),
            source4: IpNet::parse("192.0.2.10").ok(),
            source6: IpNet::parse("2001:db8::10").ok(),
            driver: driver.to_string(),
            ..Default::default()
        })
        .collect();
    let routers = Arc::new(RouterMap::build(configs, &drivers, executor));
    let health = Arc::new(HealthBoard::new(None));
    health.register(routers.iter().map(|r| r.name()));

    let state = Arc::new(AppState {
        routers,
        health,
        ws_hub: None,
    });
    (crate::router::build(state.clone(), Duration::from_secs(5)), state)
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    send(app, request).await
}

pub async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}
