use crate::error::LgResult;
use crate::models::RouterConfig;
use crate::utils::{Family, IpNet};

use super::{Driver, Query};

/// Native driver for FRRouting on Linux hosts (iputils/traceroute + vtysh)
#[derive(Debug, Clone, Copy, Default)]
pub struct FRRouting;

fn family_flag(ip: &IpNet) -> &'static str {
    match ip.family() {
        Family::Ipv4 => "-4",
        Family::Ipv6 => "-6",
    }
}

impl Driver for FRRouting {
    fn commands(&self, cfg: &RouterConfig, query: &Query<'_>) -> LgResult<Vec<String>> {
        let vrf = cfg.vrf_or_default();
        let cmds = match query {
            Query::Ping(ip) => vec![format!(
                "ping -n {} -c 5 -I {} {}",
                family_flag(ip),
                cfg.source(ip.family()),
                ip.ip()
            )],
            Query::Traceroute(ip) => vec![format!(
                "traceroute {} -w 1 -q 1 -I --back --mtu -e -s {} {}",
                family_flag(ip),
                cfg.source(ip.family()),
                ip.ip()
            )],
            Query::BgpRoute(ip) => vec![format!(
                "vtysh -c 'show bgp vrf {} {} unicast {}'",
                vrf,
                ip.family(),
                ip.ip()
            )],
            Query::BgpCommunity(community) => [Family::Ipv4, Family::Ipv6]
                .iter()
                .map(|f| {
                    format!(
                        "vtysh -c 'show bgp vrf {} {} unicast community {}'",
                        vrf, f, community
                    )
                })
                .collect(),
            Query::BgpAsPath(aspath) => [Family::Ipv4, Family::Ipv6]
                .iter()
                .map(|f| {
                    format!(
                        "vtysh -c 'show bgp vrf {} {} unicast regexp {}'",
                        vrf, f, aspath
                    )
                })
                .collect(),
        };
        Ok(cmds)
    }
}
