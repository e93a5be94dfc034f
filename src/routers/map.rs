use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::LgResult;
use crate::models::{HealthCheck, RouterConfig};
use crate::utils::RemoteExecutor;

use super::{Driver, DriverRegistry, Query};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// A configured device bound to its driver, with its last health observation
pub struct RouterInstance {
    config: RouterConfig,
    driver: Arc<dyn Driver>,
    executor: Arc<dyn RemoteExecutor>,
    health: RwLock<HealthCheck>,
}

impl RouterInstance {
    pub fn new(config: RouterConfig, driver: Arc<dyn Driver>, executor: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            config,
            driver,
            executor,
            health: RwLock::new(HealthCheck::default()),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Render `query` with the device's driver and run the commands.
    ///
    /// Nothing is executed when rendering fails or yields no commands.
    pub async fn run(&self, query: &Query<'_>) -> LgResult<Vec<String>> {
        let commands = self.driver.commands(&self.config, query)?;
        if commands.is_empty() {
            tracing::debug!("{} on {}: no commands declared", query.operation(), self.config.name);
            return Ok(Vec::new());
        }

        tracing::debug!(
            "{} on {}: running {} command(s)",
            query.operation(),
            self.config.name,
            commands.len()
        );
        self.executor.execute(&self.config, &commands).await
    }

    /// Check connectivity with an empty command batch and record the outcome
    pub async fn healthcheck(&self) -> LgResult<()> {
        let result = self.executor.execute(&self.config, &[]).await.map(|_| ());
        if let Err(e) = &result {
            tracing::debug!("Health check for {} failed: {}", self.config.name, e);
        }

        let mut health = self.health.write();
        health.healthy = result.is_ok();
        health.checked = Some(Utc::now());
        result
    }

    pub fn health(&self) -> HealthCheck {
        *self.health.read()
    }
}

/// RouterMap holds the accepted devices in configuration order.
///
/// A device's id is its position + 1 and never changes while the process runs.
#[derive(Default)]
pub struct RouterMap {
    routers: Vec<Arc<RouterInstance>>,
}

impl RouterMap {
    /// Bind each device to its driver. Devices naming an unknown driver are
    /// skipped, so ids are dense over the accepted devices only.
    pub fn build(
        configs: Vec<RouterConfig>,
        drivers: &DriverRegistry,
        executor: Arc<dyn RemoteExecutor>,
    ) -> Self {
        let mut routers = Vec::with_capacity(configs.len());
        for config in configs {
            let Some(driver) = drivers.get(&config.driver) else {
                tracing::error!(
                    "Router {} has unknown type {}, skipping",
                    config.name,
                    config.driver
                );
                continue;
            };
            tracing::info!(
                "Router {} ({}) added with id {}",
                config.name,
                config.driver,
                routers.len() + 1
            );
            routers.push(Arc::new(RouterInstance::new(config, driver, executor.clone())));
        }
        Self { routers }
    }

    /// Look up a device by its 1-based id
    pub fn get_by_ordinal(&self, id: i64) -> Option<&Arc<RouterInstance>> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.routers.get(idx)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<RouterInstance>> {
        self.routers.iter().find(|r| r.name() == name)
    }

    /// One page of devices with their ids, plus the token of the next page.
    ///
    /// A zero page size or token selects the defaults (10 and 1). A page
    /// starting past the end is empty with no next token.
    pub fn list(&self, page_size: u32, page_token: u32) -> (Vec<(i64, &Arc<RouterInstance>)>, Option<u32>) {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        let page_size = page_size as usize;
        let page_token = page_token.max(1);

        let total = self.routers.len();
        let start = (page_token as usize - 1).saturating_mul(page_size);
        if start >= total {
            return (Vec::new(), None);
        }
        let end = start.saturating_add(page_size).min(total);

        let page = self.routers[start..end]
            .iter()
            .enumerate()
            .map(|(k, r)| ((start + k + 1) as i64, r))
            .collect();
        let next = (end < total).then(|| page_token + 1);
        (page, next)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouterInstance>> {
        self.routers.iter()
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}
