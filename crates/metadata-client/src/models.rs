//! Instance metadata models

use serde::{Deserialize, Serialize};

/// Subset of the instance metadata document used by the controller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub private_nics: Vec<PrivateNic>,
}

/// A private NIC attached to the instance
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateNic {
    #[serde(default)]
    pub id: Option<String>,
    pub mac_address: String,
    #[serde(default)]
    pub private_network_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Metadata {
    /// Whether a NIC with this hardware address is attached, compared case-insensitively.
    pub fn has_private_nic(&self, mac: &str) -> bool {
        self.private_nics
            .iter()
            .any(|nic| nic.mac_address.eq_ignore_ascii_case(mac))
    }
}
