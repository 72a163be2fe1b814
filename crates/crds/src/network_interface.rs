//! NetworkInterface CRD
//!
//! Binds one private NIC of a node to an address inside a `PrivateNetwork`.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{NETWORK_INTERFACE_FINALIZER, PrivateNetwork};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "vpc.scaleway.com",
    version = "v1alpha1",
    kind = "NetworkInterface",
    shortname = "nic",
    derive = "PartialEq",
    status = "NetworkInterfaceStatus",
    printcolumn = r#"{"name":"Node","type":"string","jsonPath":".spec.nodeName"}"#,
    printcolumn = r#"{"name":"Address","type":"string","jsonPath":".spec.address"}"#,
    printcolumn = r#"{"name":"MAC","type":"string","jsonPath":".status.macAddress"}"#,
    printcolumn = r#"{"name":"Link","type":"string","jsonPath":".status.linkName"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceSpec {
    /// Node this interface is bound to (immutable)
    pub node_name: String,

    /// Desired address of the link, in CIDR notation (e.g. "192.168.0.10/24")
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceStatus {
    /// Hardware address of the attached NIC, set once the NIC is plugged into the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    /// Host link name resolved by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,
}

impl NetworkInterface {
    /// Hardware address from status, `None` while it is unset or empty.
    pub fn mac_address(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.mac_address.as_deref())
            .filter(|mac| !mac.is_empty())
    }

    /// Host link name from status, `None` while it is unset or empty.
    pub fn link_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.link_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Whether the store has been asked to delete this object.
    pub fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Whether the teardown finalizer is still present.
    pub fn has_finalizer(&self) -> bool {
        self.finalizers()
            .iter()
            .any(|f| f == NETWORK_INTERFACE_FINALIZER)
    }

    /// Name of the owning `PrivateNetwork`, taken from the first owner reference of that kind.
    pub fn owner_network(&self) -> Option<&str> {
        self.owner_references()
            .iter()
            .find(|r| r.kind == PrivateNetwork::KIND)
            .map(|r| r.name.as_str())
    }
}
