use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

use crate::error::{LgError, LgResult};

/// Address family of an IP literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ipv4 => "ipv4",
            Family::Ipv6 => "ipv6",
        }
    }

    /// Host prefix length used when no prefix is given
    pub fn max_prefix(&self) -> u8 {
        match self {
            Family::Ipv4 => 32,
            Family::Ipv6 => 128,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated IP address with prefix length, e.g. `192.0.2.0/24`.
///
/// Only constructed through [`IpNet::parse`]; the textual IP is kept as
/// given so it can be spliced into device commands verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpNet {
    ip: String,
    prefix: u8,
    family: Family,
}

impl IpNet {
    /// Parse `ip` or `ip/prefix`.
    ///
    /// Any failure in a string carrying a prefix is `InvalidNetwork`; a bad
    /// bare literal is `InvalidAddress`.
    pub fn parse(text: &str) -> LgResult<Self> {
        let (ip, prefix) = match text.split_once('/') {
            Some((ip, prefix)) => {
                let addr: IpAddr = ip.parse().map_err(|_| LgError::InvalidNetwork)?;
                let prefix: u8 = prefix.parse().map_err(|_| LgError::InvalidNetwork)?;
                let max = if addr.is_ipv4() { 32 } else { 128 };
                if prefix > max {
                    return Err(LgError::InvalidNetwork);
                }
                (ip, Some(prefix))
            }
            None => (text, None),
        };

        if ip.parse::<IpAddr>().is_err() {
            return Err(LgError::InvalidAddress);
        }

        let family = if ip.contains(':') { Family::Ipv6 } else { Family::Ipv4 };

        Ok(Self {
            ip: ip.to_string(),
            prefix: prefix.unwrap_or_else(|| family.max_prefix()),
            family,
        })
    }

    /// Parse and require a specific family
    pub fn parse_family(text: &str, family: Family) -> LgResult<Self> {
        let net = Self::parse(text)?;
        if net.family != family {
            return Err(LgError::UnsupportedFamily);
        }
        Ok(net)
    }

    /// Resolve a caller-supplied target: an IP literal / CIDR, or a hostname
    /// whose first resolved address is used.
    pub async fn resolve(target: &str) -> LgResult<Self> {
        if target.is_empty() {
            return Err(LgError::InvalidAddress);
        }
        match Self::parse(target) {
            Ok(net) => return Ok(net),
            // hostnames never carry a prefix
            Err(e) if target.contains('/') => return Err(e),
            Err(_) => {}
        }

        let mut addrs = tokio::net::lookup_host((target, 0))
            .await
            .map_err(|e| {
                tracing::debug!("Lookup of {} failed: {}", target, e);
                LgError::InvalidAddress
            })?;

        match addrs.next() {
            Some(addr) => Self::parse(&addr.ip().to_string()),
            None => Err(LgError::InvalidAddress),
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn family(&self) -> Family {
        self.family
    }
}

impl fmt::Display for IpNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix)
    }
}

impl Serialize for IpNet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IpNet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        IpNet::parse(&text).map_err(serde::de::Error::custom)
    }
}
