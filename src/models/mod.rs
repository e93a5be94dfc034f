use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::utils::ipnet::{Family, IpNet};

/// Placeholder source addresses for devices that configure none
pub mod default_source {
    pub const IPV4: &str = "127.0.0.1";
    pub const IPV6: &str = "::1";
}

/// RouterConfig describes one device as configured by the operator
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub ssh_key: Option<PathBuf>,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "deserialize_source4")]
    pub source4: Option<IpNet>,
    #[serde(default, deserialize_with = "deserialize_source6")]
    pub source6: Option<IpNet>,
    /// Driver type name, e.g. "frrouting"
    #[serde(default, rename = "type")]
    pub driver: String,
}

impl RouterConfig {
    /// Source address used for queries of the given family
    pub fn source(&self, family: Family) -> &str {
        let (configured, fallback) = match family {
            Family::Ipv4 => (&self.source4, default_source::IPV4),
            Family::Ipv6 => (&self.source6, default_source::IPV6),
        };
        configured.as_ref().map_or(fallback, |s| s.ip())
    }

    /// VRF name, falling back to the device's default table
    pub fn vrf_or_default(&self) -> &str {
        self.vrf.as_deref().filter(|v| !v.is_empty()).unwrap_or("default")
    }
}

fn deserialize_source4<'de, D: Deserializer<'de>>(d: D) -> Result<Option<IpNet>, D::Error> {
    deserialize_source(d, Family::Ipv4)
}

fn deserialize_source6<'de, D: Deserializer<'de>>(d: D) -> Result<Option<IpNet>, D::Error> {
    deserialize_source(d, Family::Ipv6)
}

fn deserialize_source<'de, D: Deserializer<'de>>(
    d: D,
    family: Family,
) -> Result<Option<IpNet>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    raw.filter(|s| !s.is_empty())
        .map(|s| IpNet::parse_family(&s, family))
        .transpose()
        .map_err(|e| serde::de::Error::custom(format!("source {}: {}", family, e)))
}

/// HealthCheck is the last observation of a device's reachability.
///
/// `checked` is `None` until the first check completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub healthy: bool,
    #[serde(rename = "timestamp")]
    pub checked: Option<DateTime<Utc>>,
}

impl HealthCheck {
    pub fn is_unknown(&self) -> bool {
        self.checked.is_none()
    }
}

/// BGP standard community as submitted by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Community {
    pub asn: u32,
    pub value: u32,
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asn, self.value)
    }
}

/// InfoResponse identifies the serving instance
#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub hostname: String,
    pub version: String,
}

/// Query parameters for paging through routers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRoutersQuery {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page_token: u32,
}

/// RouterSummary is the public view of a configured device
#[derive(Debug, Clone, Serialize)]
pub struct RouterSummary {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub health: HealthCheck,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRoutersResponse {
    pub routers: Vec<RouterSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
}

/// TargetRequest carries an address or hostname for ping/traceroute/route lookups
#[derive(Debug, Clone, Deserialize)]
pub struct TargetRequest {
    pub target: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommunityRequest {
    pub community: Community,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsPathRequest {
    pub pattern: String,
}

/// LookupResponse holds raw device output joined into one blob
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

impl LookupResponse {
    pub fn from_outputs(outputs: Vec<String>) -> Self {
        Self {
            result: outputs.join("\n"),
            timestamp: Utc::now(),
        }
    }
}
