//! iproute2 backed link synchronizer
//!
//! Inspects state through `ip -json` and changes it with plain `ip` commands.
//! Every operation re-reads the kernel state first, so repeated calls converge
//! instead of failing on already-applied changes.

use crate::error::LinkError;
use crate::link_trait::LinkSynchronizer;
use crate::models::{AddrInfo, IpLink, IpLinkAddresses, IpRouteEntry};
use crate::route::{Route, RouteChanges};
use crate::runner::{CommandRunner, IpCommand};
use ipnet::IpNet;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::{debug, info};

/// Link synchronizer driving the host through `ip`(8).
pub struct IpRouteLinks<R = IpCommand> {
    runner: R,
}

impl IpRouteLinks<IpCommand> {
    /// Create a synchronizer using the given `ip` binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self::with_runner(IpCommand::new(binary))
    }
}

impl<R: CommandRunner> IpRouteLinks<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    async fn exec(&self, args: &[&str]) -> Result<String, LinkError> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        self.runner.run(&args).await
    }

    async fn query<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>, LinkError> {
        let mut full = vec!["-j"];
        full.extend_from_slice(args);
        let out = self.exec(&full).await?;
        if out.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&out).map_err(|source| LinkError::Decode {
            command: format!("ip {}", full.join(" ")),
            source,
        })
    }

    async fn find_link(&self, mac: &str) -> Result<IpLink, LinkError> {
        let links: Vec<IpLink> = self.query(&["link", "show"]).await?;
        links
            .into_iter()
            .find(|l| l.has_address(mac))
            .ok_or_else(|| LinkError::LinkNotFound(mac.to_string()))
    }

    async fn global_addresses(&self, ifname: &str) -> Result<Vec<IpNet>, LinkError> {
        let entries: Vec<IpLinkAddresses> = self.query(&["addr", "show", "dev", ifname]).await?;
        Ok(entries
            .iter()
            .flat_map(|e| e.addr_info.iter())
            .filter_map(AddrInfo::global_net)
            .collect())
    }

    async fn installed_routes(&self, ifname: &str) -> Result<Vec<Route>, LinkError> {
        let mut routes = Vec::new();
        for family in ["-4", "-6"] {
            let entries: Vec<IpRouteEntry> =
                self.query(&[family, "route", "show", "dev", ifname]).await?;
            for entry in &entries {
                let route = entry.managed_route().map_err(|value| LinkError::InvalidValue {
                    link: ifname.to_string(),
                    value,
                })?;
                routes.extend(route);
            }
        }
        Ok(routes)
    }
}

#[async_trait::async_trait]
impl<R: CommandRunner> LinkSynchronizer for IpRouteLinks<R> {
    async fn tear_down_link(&self, mac: &str, address: &IpNet) -> Result<(), LinkError> {
        // A detached NIC has no link left to tear down.
        let link = match self.find_link(mac).await {
            Ok(link) => link,
            Err(LinkError::LinkNotFound(_)) => {
                debug!(%mac, "link already gone, nothing to tear down");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let ifname = link.ifname.as_str();

        if self.global_addresses(ifname).await?.contains(address) {
            let addr = address.to_string();
            self.exec(&["addr", "del", &addr, "dev", ifname]).await?;
            info!(link = %ifname, address = %addr, "removed address");
        }
        self.exec(&["link", "set", "dev", ifname, "down"]).await?;
        info!(link = %ifname, %mac, "link torn down");
        Ok(())
    }

    async fn get_link_name(&self, mac: &str) -> Result<String, LinkError> {
        Ok(self.find_link(mac).await?.ifname)
    }

    async fn configure_link(&self, mac: &str, address: &IpNet) -> Result<(), LinkError> {
        let link = self.find_link(mac).await?;
        let ifname = link.ifname.as_str();

        if link.operstate.as_deref() != Some("UP") {
            self.exec(&["link", "set", "dev", ifname, "up"]).await?;
            debug!(link = %ifname, "link set up");
        }

        let current = self.global_addresses(ifname).await?;
        let same_family = |net: &IpNet| net.addr().is_ipv4() == address.addr().is_ipv4();
        for stale in current.iter().filter(|n| same_family(n) && *n != address) {
            let stale = stale.to_string();
            self.exec(&["addr", "del", &stale, "dev", ifname]).await?;
            info!(link = %ifname, address = %stale, "removed stale address");
        }

        if !current.contains(address) {
            let addr = address.to_string();
            self.exec(&["addr", "add", &addr, "dev", ifname]).await?;
            info!(link = %ifname, address = %addr, "assigned address");
        }
        Ok(())
    }

    async fn sync_routes(&self, mac: &str, routes: &[Route]) -> Result<(), LinkError> {
        let link = self.find_link(mac).await?;
        let ifname = link.ifname.as_str();

        let installed = self.installed_routes(ifname).await?;
        let changes = RouteChanges::between(&installed, routes);
        if changes.is_empty() {
            debug!(link = %ifname, routes = routes.len(), "routes already converged");
            return Ok(());
        }

        for route in &changes.remove {
            let (to, via) = (route.to.to_string(), route.via.to_string());
            self.exec(&["route", "del", &to, "via", &via, "dev", ifname]).await?;
            info!(link = %ifname, %route, "removed route");
        }
        for route in &changes.add {
            let (to, via) = (route.to.to_string(), route.via.to_string());
            self.exec(&["route", "replace", &to, "via", &via, "dev", ifname]).await?;
            info!(link = %ifname, %route, "installed route");
        }
        Ok(())
    }
}
