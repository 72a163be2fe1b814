//! VPC NIC CRD Definitions
//!
//! Kubernetes Custom Resource Definitions shared by the node-local
//! network interface controller.

pub mod network_interface;
pub mod private_network;

pub use network_interface::*;
pub use private_network::*;

/// API group of every resource in this crate.
pub const API_GROUP: &str = "vpc.scaleway.com";

/// Label carried by each `NetworkInterface`, naming the `PrivateNetwork` it belongs to.
pub const PRIVATE_NETWORK_LABEL: &str = "vpc.scaleway.com/private-network";

/// Finalizer placed on a `NetworkInterface` by the provisioning path.
///
/// Its presence means the host link must be torn down before the object can go away.
pub const NETWORK_INTERFACE_FINALIZER: &str = "vpc.scaleway.com/network-interface";
