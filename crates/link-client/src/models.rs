//! Deserialization models for `ip -json` output

use crate::route::Route;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const DEFAULT_V4: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::UNSPECIFIED, 0);
const DEFAULT_V6: Ipv6Net = Ipv6Net::new_assert(Ipv6Addr::UNSPECIFIED, 0);

/// One entry of `ip -j link show`
#[derive(Debug, Clone, Deserialize)]
pub struct IpLink {
    pub ifname: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub operstate: Option<String>,
}

impl IpLink {
    /// Whether this link carries `mac`, compared case-insensitively.
    pub fn has_address(&self, mac: &str) -> bool {
        self.address
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(mac))
    }
}

/// One entry of `ip -j addr show`
#[derive(Debug, Clone, Deserialize)]
pub struct IpLinkAddresses {
    pub ifname: String,
    #[serde(default)]
    pub addr_info: Vec<AddrInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddrInfo {
    pub family: String,
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub prefixlen: Option<u8>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl AddrInfo {
    /// Global-scope address as a network, `None` for link-local or incomplete entries.
    pub fn global_net(&self) -> Option<IpNet> {
        if self.scope.as_deref() != Some("global") {
            return None;
        }
        let local: IpAddr = self.local.as_deref()?.parse().ok()?;
        IpNet::new(local, self.prefixlen?).ok()
    }
}

/// One entry of `ip -j route show`
#[derive(Debug, Clone, Deserialize)]
pub struct IpRouteEntry {
    pub dst: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl IpRouteEntry {
    /// Gateway route managed by the synchronizer, `None` for kernel-installed or on-link routes.
    ///
    /// Returns the unparseable value on error.
    pub fn managed_route(&self) -> Result<Option<Route>, String> {
        if self.protocol.as_deref() == Some("kernel") {
            return Ok(None);
        }
        let Some(gateway) = self.gateway.as_deref() else {
            return Ok(None);
        };
        let via: IpAddr = gateway.parse().map_err(|_| gateway.to_string())?;

        let to = match self.dst.as_str() {
            "default" if via.is_ipv4() => IpNet::V4(DEFAULT_V4),
            "default" => IpNet::V6(DEFAULT_V6),
            dst if dst.contains('/') => dst.parse().map_err(|_| dst.to_string())?,
            dst => {
                let host: IpAddr = dst.parse().map_err(|_| dst.to_string())?;
                IpNet::from(host)
            }
        };
        Ok(Some(Route::new(to, via)))
    }
}
