//! Data-driven drivers defined by YAML template documents.
//!
//! A document names the driver and lists Tera command templates per
//! operation:
//!
//! ```yaml
//! name: myvendor
//! ping:
//!   any:  ["ping {{ ip.address }} source {{ source }}"]
//! traceroute:
//!   ipv4: ["traceroute {{ ip.address }}"]
//!   ipv6: ["traceroute6 {{ ip.address }}"]
//! bgp:
//!   route:     ["show bgp {{ ip.family }} unicast {{ ip.address }}"]
//!   community: ["show bgp community {{ community }}"]
//!   aspath:    ["show bgp regexp {{ aspath }}"]
//! ```
//!
//! Templates only see a closed set of variables (`cfg`, plus `ip`/`source`,
//! `community` or `aspath` depending on the operation). Every template is
//! trial-rendered when the document is loaded so unknown variables and
//! syntax errors are caught at startup.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};

use crate::error::{LgError, LgResult};
use crate::models::{Community, RouterConfig};
use crate::utils::{Family, IpNet};

use super::{Driver, Operation, Query};

/// Documents shipped inside the binary
const BUNDLED: &[(&str, &str)] = &[
    ("eos.yml", include_str!("bundled/eos.yml")),
    ("iosxr.yml", include_str!("bundled/iosxr.yml")),
    ("nxos.yml", include_str!("bundled/nxos.yml")),
];

#[derive(Debug, Default, Deserialize)]
struct TemplateDocument {
    name: String,
    #[serde(default)]
    ping: Option<FamilyTemplates>,
    #[serde(default)]
    traceroute: Option<FamilyTemplates>,
    #[serde(default)]
    bgp: BgpTemplates,
}

#[derive(Debug, Default, Deserialize)]
struct FamilyTemplates {
    #[serde(default)]
    any: Option<Vec<String>>,
    #[serde(default)]
    ipv4: Option<Vec<String>>,
    #[serde(default)]
    ipv6: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct BgpTemplates {
    #[serde(default)]
    route: Option<Vec<String>>,
    #[serde(default)]
    community: Option<Vec<String>>,
    #[serde(default)]
    aspath: Option<Vec<String>>,
}

/// Which template list of an operation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Variant {
    Any,
    Family(Family),
}

type SectionKey = (Operation, Variant);

#[derive(Serialize)]
struct DeviceView<'a> {
    name: &'a str,
    hostname: &'a str,
    vrf: &'a str,
    location: &'a str,
    source4: &'a str,
    source6: &'a str,
}

#[derive(Serialize)]
struct AddressView<'a> {
    address: &'a str,
    prefix: u8,
    cidr: String,
    family: &'static str,
}

/// The complete set of variables a template may reference
#[derive(Serialize)]
struct TemplateContext<'a> {
    cfg: DeviceView<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<AddressView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    community: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspath: Option<&'a str>,
}

impl<'a> TemplateContext<'a> {
    fn new(cfg: &'a RouterConfig, query: &Query<'a>) -> Self {
        let mut ctx = Self {
            cfg: DeviceView {
                name: &cfg.name,
                hostname: &cfg.hostname,
                vrf: cfg.vrf_or_default(),
                location: &cfg.location,
                source4: cfg.source(Family::Ipv4),
                source6: cfg.source(Family::Ipv6),
            },
            ip: None,
            source: None,
            community: None,
            aspath: None,
        };
        match *query {
            Query::Ping(ip) | Query::Traceroute(ip) | Query::BgpRoute(ip) => {
                ctx.ip = Some(AddressView {
                    address: ip.ip(),
                    prefix: ip.prefix(),
                    cidr: ip.to_string(),
                    family: ip.family().as_str(),
                });
                ctx.source = Some(cfg.source(ip.family()));
            }
            Query::BgpCommunity(community) => ctx.community = Some(community.to_string()),
            Query::BgpAsPath(aspath) => ctx.aspath = Some(aspath),
        }
        ctx
    }
}

/// Flatten a tera error and its causes into one line
fn tera_error_chain(err: &tera::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    msg
}

/// A Driver whose commands come from a template document
pub struct TemplateDriver {
    name: String,
    tera: Tera,
    /// Template names per declared section, in document order
    sections: HashMap<SectionKey, Vec<String>>,
}

impl std::fmt::Debug for TemplateDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateDriver")
            .field("name", &self.name)
            .field("sections", &self.sections.len())
            .finish()
    }
}

impl TemplateDriver {
    /// Parse, compile and validate a document
    pub fn from_yaml(source: &str, content: &str) -> Result<Self> {
        let doc: TemplateDocument = serde_yaml::from_str(content)
            .with_context(|| format!("Invalid template document {}", source))?;

        let mut driver = Self {
            name: doc.name,
            tera: Tera::default(),
            sections: HashMap::new(),
        };
        driver.tera.autoescape_on(vec![]);

        for (op, family_templates) in [
            (Operation::Ping, doc.ping),
            (Operation::Traceroute, doc.traceroute),
        ] {
            let Some(ft) = family_templates else { continue };
            driver.add_section(op, Variant::Any, ft.any)?;
            driver.add_section(op, Variant::Family(Family::Ipv4), ft.ipv4)?;
            driver.add_section(op, Variant::Family(Family::Ipv6), ft.ipv6)?;
        }
        driver.add_section(Operation::BgpRoute, Variant::Any, doc.bgp.route)?;
        driver.add_section(Operation::BgpCommunity, Variant::Any, doc.bgp.community)?;
        driver.add_section(Operation::BgpAsPath, Variant::Any, doc.bgp.aspath)?;

        driver
            .validate()
            .with_context(|| format!("Invalid template document {}", source))?;
        Ok(driver)
    }

    /// Load a document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&path.display().to_string(), &content)
    }

    /// Load every `.yml`/`.yaml` document in `dir`, in file name order
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yml" || e == "yaml");
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Documents compiled into the binary
    pub fn bundled() -> Result<Vec<Self>> {
        BUNDLED
            .iter()
            .map(|(file, content)| Self::from_yaml(file, content))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn add_section(&mut self, op: Operation, variant: Variant, templates: Option<Vec<String>>) -> Result<()> {
        let Some(templates) = templates else {
            return Ok(());
        };

        let mut names = Vec::with_capacity(templates.len());
        for (idx, content) in templates.iter().enumerate() {
            let name = match variant {
                Variant::Any => format!("{}.any.{}", op, idx),
                Variant::Family(f) => format!("{}.{}.{}", op, f, idx),
            };
            self.tera
                .add_raw_template(&name, content)
                .map_err(|e| anyhow::anyhow!("Invalid template {} ({:?}): {}", name, content, tera_error_chain(&e)))?;
            names.push(name);
        }
        self.sections.insert((op, variant), names);
        Ok(())
    }

    /// Trial-render every template against sample parameters of its operation
    fn validate(&self) -> Result<()> {
        let cfg = RouterConfig {
            name: "sample".into(),
            hostname: "sample.example.net".into(),
            vrf: Some("sample".into()),
            location: "sample".into(),
            ..Default::default()
        };
        let v4 = IpNet::parse("192.0.2.1").map_err(|e| anyhow::anyhow!(e))?;
        let v6 = IpNet::parse("2001:db8::1").map_err(|e| anyhow::anyhow!(e))?;
        let community = Community { asn: 65000, value: 1 };

        for ((op, variant), names) in &self.sections {
            let addresses: Vec<&IpNet> = match variant {
                Variant::Family(Family::Ipv4) => vec![&v4],
                Variant::Family(Family::Ipv6) => vec![&v6],
                Variant::Any => vec![&v4, &v6],
            };
            let queries: Vec<Query<'_>> = match op {
                Operation::Ping => addresses.into_iter().map(Query::Ping).collect(),
                Operation::Traceroute => addresses.into_iter().map(Query::Traceroute).collect(),
                Operation::BgpRoute => addresses.into_iter().map(Query::BgpRoute).collect(),
                Operation::BgpCommunity => vec![Query::BgpCommunity(&community)],
                Operation::BgpAsPath => vec![Query::BgpAsPath("_65000$")],
            };
            for query in &queries {
                self.render(names, &cfg, query)
                    .map_err(|e| anyhow::anyhow!("{} templates: {}", op, e))?;
            }
        }
        Ok(())
    }

    fn section(&self, query: &Query<'_>) -> Option<&Vec<String>> {
        let op = query.operation();
        match query {
            Query::Ping(ip) | Query::Traceroute(ip) => self
                .sections
                .get(&(op, Variant::Any))
                .or_else(|| self.sections.get(&(op, Variant::Family(ip.family())))),
            _ => self.sections.get(&(op, Variant::Any)),
        }
    }

    fn render(&self, names: &[String], cfg: &RouterConfig, query: &Query<'_>) -> LgResult<Vec<String>> {
        let ctx = Context::from_serialize(TemplateContext::new(cfg, query))
            .map_err(|e| LgError::Template(tera_error_chain(&e)))?;
        names
            .iter()
            .map(|name| {
                self.tera
                    .render(name, &ctx)
                    .map_err(|e| LgError::Template(format!("{}: {}", name, tera_error_chain(&e))))
            })
            .collect()
    }
}

impl Driver for TemplateDriver {
    fn commands(&self, cfg: &RouterConfig, query: &Query<'_>) -> LgResult<Vec<String>> {
        let names = self.section(query).ok_or(LgError::OperationUnknown)?;
        self.render(names, cfg, query)
    }
}
