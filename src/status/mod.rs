use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::routers::RouterMap;
use crate::ws::Hub;

/// Overall service name in the health board
pub const SERVICE_NAME: &str = "lookingglass";

/// Health board name of a device
pub fn service_name(device: &str) -> String {
    format!("{}/{}", SERVICE_NAME, device)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStatus {
    Serving,
    NotServing,
    Unknown,
}

impl From<bool> for ServingStatus {
    fn from(serving: bool) -> Self {
        if serving {
            ServingStatus::Serving
        } else {
            ServingStatus::NotServing
        }
    }
}

/// Receives device serving/not-serving status from the health monitor
#[async_trait]
pub trait HealthReporter: Send + Sync {
    /// Record the first observation of a device. Not a transition.
    fn seed(&self, _device: &str, _serving: bool) {}

    /// A device flipped between healthy and unhealthy
    async fn set_serving(&self, device: &str, serving: bool);
}

/// Per-service status map exported over the health endpoints
pub struct HealthBoard {
    statuses: RwLock<BTreeMap<String, ServingStatus>>,
    hub: Option<Arc<Hub>>,
}

impl HealthBoard {
    pub fn new(hub: Option<Arc<Hub>>) -> Self {
        let mut statuses = BTreeMap::new();
        statuses.insert(SERVICE_NAME.to_string(), ServingStatus::Serving);
        Self {
            statuses: RwLock::new(statuses),
            hub,
        }
    }

    /// Add devices as `unknown` until their first check completes
    pub fn register<'a>(&self, devices: impl IntoIterator<Item = &'a str>) {
        let mut statuses = self.statuses.write();
        for device in devices {
            statuses.insert(service_name(device), ServingStatus::Unknown);
        }
    }

    pub fn status(&self, service: &str) -> Option<ServingStatus> {
        self.statuses.read().get(service).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, ServingStatus> {
        self.statuses.read().clone()
    }

    fn set(&self, device: &str, serving: bool) {
        self.statuses.write().insert(service_name(device), serving.into());
    }
}

#[async_trait]
impl HealthReporter for HealthBoard {
    fn seed(&self, device: &str, serving: bool) {
        self.set(device, serving);
    }

    async fn set_serving(&self, device: &str, serving: bool) {
        self.set(device, serving);
        if let Some(hub) = &self.hub {
            hub.broadcast_router_health(device, serving);
        }
    }
}

/// Health monitor checks every device on a fixed period and reports flips
pub struct HealthMonitor {
    routers: Arc<RouterMap>,
    reporter: Arc<dyn HealthReporter>,
    period: Duration,
}

impl HealthMonitor {
    pub fn new(routers: Arc<RouterMap>, reporter: Arc<dyn HealthReporter>, period: Duration) -> Self {
        Self {
            routers,
            reporter,
            period,
        }
    }

    /// First check of every device. Seeds the reporter without reporting transitions.
    pub async fn check_initial(&self) {
        let checks = self.routers.iter().map(|r| async move {
            let healthy = r.healthcheck().await.is_ok();
            (r, healthy)
        });
        for (router, healthy) in join_all(checks).await {
            tracing::info!(
                "Router {} initial health: {}",
                router.name(),
                if healthy { "healthy" } else { "unhealthy" }
            );
            self.reporter.seed(router.name(), healthy);
        }
    }

    /// Check every device once. Returns the devices whose health flipped.
    pub async fn tick(&self) -> Vec<(String, bool)> {
        let checks = self.routers.iter().map(|r| async move {
            // an unknown record counts as unhealthy
            let was_healthy = r.health().healthy;
            let result = r.healthcheck().await;
            (r, was_healthy, result)
        });

        let mut transitions = Vec::new();
        for (router, was_healthy, result) in join_all(checks).await {
            let healthy = result.is_ok();
            if was_healthy != healthy {
                match &result {
                    Ok(()) => tracing::info!("Router {} is now healthy", router.name()),
                    Err(e) => tracing::warn!("Router {} is now unhealthy: {}", router.name(), e),
                }
                self.reporter.set_serving(router.name(), healthy).await;
                transitions.push((router.name().to_string(), healthy));
            }
        }
        transitions
    }

    /// Run the initial check, then tick until `token` is cancelled
    pub fn start(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "Health monitor started for {} routers every {:?}",
                self.routers.len(),
                self.period
            );

            tokio::select! {
                _ = self.check_initial() => {}
                _ = token.cancelled() => {
                    tracing::info!("Health monitor stopped");
                    return;
                }
            }

            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = token.cancelled() => break,
                }
                tokio::select! {
                    transitions = self.tick() => {
                        tracing::debug!("Health tick complete, {} transition(s)", transitions.len());
                    }
                    _ = token.cancelled() => break,
                }
            }

            tracing::info!("Health monitor stopped");
        })
    }
}
