pub mod frrouting;
pub mod map;
pub mod template;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::LgResult;
use crate::models::{Community, RouterConfig};
use crate::utils::IpNet;

pub use frrouting::FRRouting;
pub use map::{RouterInstance, RouterMap};
pub use template::TemplateDriver;

/// Operations a caller may run against a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    Traceroute,
    BgpRoute,
    BgpCommunity,
    BgpAsPath,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Ping => "ping",
            Operation::Traceroute => "traceroute",
            Operation::BgpRoute => "bgp.route",
            Operation::BgpCommunity => "bgp.community",
            Operation::BgpAsPath => "bgp.aspath",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation together with its already-validated parameter
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    Ping(&'a IpNet),
    Traceroute(&'a IpNet),
    BgpRoute(&'a IpNet),
    BgpCommunity(&'a Community),
    /// Sanitized AS-path pattern
    BgpAsPath(&'a str),
}

impl Query<'_> {
    pub fn operation(&self) -> Operation {
        match self {
            Query::Ping(_) => Operation::Ping,
            Query::Traceroute(_) => Operation::Traceroute,
            Query::BgpRoute(_) => Operation::BgpRoute,
            Query::BgpCommunity(_) => Operation::BgpCommunity,
            Query::BgpAsPath(_) => Operation::BgpAsPath,
        }
    }
}

/// A Driver renders an operation into the vendor command strings for a device.
///
/// Drivers hold no per-device state and are shared by every device of their type.
pub trait Driver: Send + Sync {
    fn commands(&self, cfg: &RouterConfig, query: &Query<'_>) -> LgResult<Vec<String>>;
}

/// Maps driver type names to drivers. The first registration of a name wins.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the process catalog: compiled drivers, then documents from
    /// `drivers_dir` (if any), then the bundled documents.
    pub fn load(drivers_dir: Option<&Path>) -> Result<Self> {
        let mut registry = Self::new();
        registry.register_native()?;

        if let Some(dir) = drivers_dir {
            for driver in TemplateDriver::load_dir(dir)
                .with_context(|| format!("Failed to load drivers from {}", dir.display()))?
            {
                registry.register(&driver.name().to_string(), Arc::new(driver))?;
            }
        }

        for driver in TemplateDriver::bundled().context("Failed to load bundled drivers")? {
            registry.register(&driver.name().to_string(), Arc::new(driver))?;
        }

        Ok(registry)
    }

    /// Register the compiled-in drivers
    pub fn register_native(&mut self) -> Result<()> {
        self.register("frrouting", Arc::new(FRRouting))?;
        Ok(())
    }

    /// Register `driver` under `name`. Returns `Ok(false)` when the name is
    /// already taken (the new driver is dropped); an empty name is an error.
    pub fn register(&mut self, name: &str, driver: Arc<dyn Driver>) -> Result<bool> {
        if name.is_empty() {
            anyhow::bail!("Router name cannot be empty");
        }
        if self.drivers.contains_key(name) {
            tracing::warn!("Router {} already registered, skipping", name);
            return Ok(false);
        }
        self.drivers.insert(name.to_string(), driver);
        tracing::info!("Router {} registered", name);
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
