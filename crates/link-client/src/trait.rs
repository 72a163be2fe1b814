//! LinkSynchronizer trait for mocking
//!
//! The controller only talks to host links through this trait; the iproute2
//! backend implements it and tests substitute the mock.

use crate::error::LinkError;
use crate::route::Route;
use ipnet::IpNet;

/// Operations on the host link identified by a hardware address.
#[async_trait::async_trait]
pub trait LinkSynchronizer: Send + Sync {
    /// Removes `address` from the link and brings it down.
    async fn tear_down_link(&self, mac: &str, address: &IpNet) -> Result<(), LinkError>;

    /// Resolves the kernel name of the link carrying `mac`.
    async fn get_link_name(&self, mac: &str) -> Result<String, LinkError>;

    /// Brings the link up with `address` as its only global address of that family.
    async fn configure_link(&self, mac: &str, address: &IpNet) -> Result<(), LinkError>;

    /// Converges the gateway routes of the link to exactly `routes`.
    async fn sync_routes(&self, mac: &str, routes: &[Route]) -> Result<(), LinkError>;
}
