use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{default_source, RouterConfig};
use crate::utils::{with_default_port, IpNet};

/// Config holds the process settings
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: String,
    pub listen_addr: String,
    pub health_interval: Duration,
    pub ssh_timeout: Duration,
    pub request_timeout: Duration,
    /// Overrides the catalog's `drivers_dir` when set
    pub drivers_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            catalog_path: get_env("LG_CONFIG", "config.yaml"),
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:8080"),
            health_interval: get_env_secs("HEALTH_INTERVAL_SECS", 60),
            ssh_timeout: get_env_secs("SSH_TIMEOUT_SECS", 30),
            request_timeout: get_env_secs("REQUEST_TIMEOUT_SECS", 120),
            drivers_dir: env::var("DRIVERS_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// External driver directory, preferring the environment over the catalog
    pub fn drivers_dir<'a>(&'a self, catalog: &'a Catalog) -> Option<&'a Path> {
        self.drivers_dir.as_deref().or(catalog.drivers_dir.as_deref())
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_secs(key: &str, default: u64) -> Duration {
    let secs = get_env(key, &default.to_string())
        .parse()
        .ok()
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Catalog is the operator's device list and driver settings
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub devices: Vec<RouterConfig>,
    #[serde(default)]
    pub drivers_dir: Option<PathBuf>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut catalog: Catalog = serde_yaml::from_str(content)?;
        catalog.apply_defaults()?;
        Ok(catalog)
    }

    /// Drop devices without a hostname and fill in ports and source addresses
    fn apply_defaults(&mut self) -> Result<()> {
        self.devices.retain(|d| {
            if d.hostname.is_empty() {
                tracing::warn!("Router {} has no hostname, dropping", d.name);
                return false;
            }
            true
        });

        for device in &mut self.devices {
            device.hostname = with_default_port(&device.hostname);
            if device.source4.is_none() {
                device.source4 = Some(IpNet::parse(default_source::IPV4)?);
            }
            if device.source6.is_none() {
                device.source6 = Some(IpNet::parse(default_source::IPV6)?);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routers::{DriverRegistry, RouterMap};
    use crate::testing::ScriptedExecutor;
    use std::sync::Arc;

    const CATALOG: &str = r#"
drivers_dir: /etc/lg/drivers
devices:
  - name: fra1
    hostname: fra1.example.net
    username: lg
    password: secret
    location: Frankfurt
    source4: 192.0.2.1
    type: frrouting
  - name: orphan
    hostname: ""
    type: frrouting
  - name: ams1
    hostname: "[2001:db8::5]:2222"
    ssh_key: /etc/lg/id_ed25519
    vrf: internet
    type: eos
"#;

    #[test]
    fn test_catalog_defaults() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let names: Vec<&str> = catalog.devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fra1", "ams1"]);

        let fra1 = &catalog.devices[0];
        assert_eq!(fra1.hostname, "fra1.example.net:22");
        assert_eq!(fra1.source4.as_ref().unwrap().ip(), "192.0.2.1");
        assert_eq!(fra1.source6.as_ref().unwrap().ip(), "::1");

        let ams1 = &catalog.devices[1];
        assert_eq!(ams1.hostname, "[2001:db8::5]:2222");
        assert_eq!(ams1.source4.as_ref().unwrap().ip(), "127.0.0.1");
        assert_eq!(ams1.ssh_key.as_deref(), Some(Path::new("/etc/lg/id_ed25519")));
    }

    #[test]
    fn test_device_without_type_is_skipped_not_fatal() {
        let yaml = "devices:\n  - name: good\n    hostname: good.example.net\n    type: frrouting\n  - name: notype\n    hostname: notype.example.net\n";
        let catalog = Catalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.devices.len(), 2);
        assert_eq!(catalog.devices[1].driver, "");

        let drivers = DriverRegistry::load(None).unwrap();
        let executor = Arc::new(ScriptedExecutor::default());
        let map = RouterMap::build(catalog.devices, &drivers, executor);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_by_ordinal(1).unwrap().name(), "good");
    }

    #[test]
    fn test_drivers_dir_env_override() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let mut config = Config {
            catalog_path: "config.yaml".into(),
            listen_addr: "127.0.0.1:0".into(),
            health_interval: Duration::from_secs(60),
            ssh_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            drivers_dir: None,
        };
        assert_eq!(config.drivers_dir(&catalog), Some(Path::new("/etc/lg/drivers")));

        config.drivers_dir = Some(PathBuf::from("/srv/drivers"));
        assert_eq!(config.drivers_dir(&catalog), Some(Path::new("/srv/drivers")));
    }

    #[test]
    fn test_wrong_source_family_rejected() {
        let yaml = "devices:\n  - name: r\n    hostname: r\n    type: eos\n    source6: 192.0.2.1\n";
        assert!(Catalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::from_yaml("{}").unwrap();
        assert!(catalog.devices.is_empty());
        assert!(catalog.drivers_dir.is_none());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Catalog::load(Path::new("/nonexistent/config.yaml")).is_err());
    }
}
