//! Pure planning of a reconciliation pass.
//!
//! [`plan`] maps an observed `NetworkInterface` and the engine settings to
//! the ordered steps a pass must execute. Nothing here performs I/O.

use super::EngineSettings;
use crate::error::ControllerError;
use crds::{NetworkInterface, PrivateNetwork};
use ipnet::IpNet;
use link_client::Route;
use std::net::IpAddr;

/// One step of an active pass, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Remove the host link configuration
    TearDownLink,
    /// Drop our finalizer so deletion can complete
    ReleaseFinalizer,
    /// Check the NIC is attached to this node
    VerifyAttached,
    /// Record the host link name in status
    ResolveLinkName,
    /// Bring the link up with its address
    ConfigureLink,
    /// Converge the link's routes to the owning network's
    SyncRoutes,
}

/// What a pass over one object amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Bound to another node: nothing to do
    Foreign,
    /// No hardware address yet: check again later
    AwaitingAddress,
    /// Work to do on the local host
    Active(Plan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub mac_address: String,
    pub address: IpNet,
    pub steps: Vec<Step>,
}

const CONVERGE: [Step; 4] = [
    Step::VerifyAttached,
    Step::ResolveLinkName,
    Step::ConfigureLink,
    Step::SyncRoutes,
];

/// Decide what a pass over `nic` must do
pub fn plan(nic: &NetworkInterface, settings: &EngineSettings) -> Result<Phase, ControllerError> {
    if nic.spec.node_name != settings.node_name {
        return Ok(Phase::Foreign);
    }
    let Some(mac_address) = nic.mac_address() else {
        return Ok(Phase::AwaitingAddress);
    };
    let address = parse_address(nic)?;

    let mut steps = Vec::with_capacity(CONVERGE.len() + 2);
    if nic.is_terminating() && nic.has_finalizer() {
        steps.push(Step::TearDownLink);
        steps.push(Step::ReleaseFinalizer);
    }
    // Short-circuit ends the pass once the finalizer is released
    if steps.is_empty() || !settings.short_circuit_after_teardown {
        steps.extend(CONVERGE);
    }

    Ok(Phase::Active(Plan {
        mac_address: mac_address.to_string(),
        address,
        steps,
    }))
}

/// Parse `spec.address` as an address with prefix length (`192.168.0.10/24`)
pub fn parse_address(nic: &NetworkInterface) -> Result<IpNet, ControllerError> {
    nic.spec
        .address
        .trim()
        .parse::<IpNet>()
        .map_err(|_| ControllerError::InvalidAddress {
            name: nic.metadata.name.clone().unwrap_or_default(),
            value: nic.spec.address.clone(),
        })
}

/// Routes a member link of `network` must carry, in declaration order
///
/// Any entry that fails to parse rejects the whole set.
pub fn desired_routes(network: &PrivateNetwork) -> Result<Vec<Route>, ControllerError> {
    let network_name = network.metadata.name.clone().unwrap_or_default();
    network
        .spec
        .routes
        .iter()
        .map(|route| {
            let to = route
                .to
                .trim()
                .parse::<IpNet>()
                .map_err(|_| ControllerError::InvalidRoute {
                    network: network_name.clone(),
                    field: "to",
                    value: route.to.clone(),
                })?;
            let via = route
                .via
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ControllerError::InvalidRoute {
                    network: network_name.clone(),
                    field: "via",
                    value: route.via.clone(),
                })?;
            Ok(Route::new(to, via).normalized())
        })
        .collect()
}
