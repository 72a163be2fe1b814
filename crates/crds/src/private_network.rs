//! PrivateNetwork CRD
//!
//! Declares a private network and the routes every member link must carry.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[kube(
    group = "vpc.scaleway.com",
    version = "v1alpha1",
    kind = "PrivateNetwork",
    shortname = "pn",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PrivateNetworkSpec {
    /// Cloud identifier of the private network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Routing table projected onto every member link, in order
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl PrivateNetwork {
    /// Kind string used in owner references.
    pub const KIND: &'static str = "PrivateNetwork";
}

/// A single route entry: traffic for `to` goes through `via`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Destination in CIDR notation
    pub to: String,

    /// Gateway address
    pub via: String,
}
