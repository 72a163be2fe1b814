//! PrivateNetwork event fan-out.
//!
//! An update to a PrivateNetwork invalidates the routes of every member
//! NetworkInterface; the fan-out turns it into one request per member.

use crate::metrics::Metrics;
use crate::store::ResourceStore;
use crate::watcher::WatchEvent;
use crds::{NetworkInterface, PrivateNetwork, PRIVATE_NETWORK_LABEL};
use kube_runtime::reflector::ObjectRef;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Label selector matching the members of `network`
pub fn member_selector(network: &str) -> String {
    format!("{}={}", PRIVATE_NETWORK_LABEL, network)
}

/// One request per member, keyed by name
pub fn requests_for(members: &[NetworkInterface]) -> Vec<ObjectRef<NetworkInterface>> {
    members
        .iter()
        .filter_map(|nic| nic.metadata.name.as_deref())
        .map(ObjectRef::new)
        .collect()
}

/// Expands PrivateNetwork events into NetworkInterface requests.
pub struct FanOut {
    store: Arc<dyn ResourceStore>,
    metrics: Arc<Metrics>,
}

impl FanOut {
    pub fn new(store: Arc<dyn ResourceStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    /// Requests triggered by one event
    ///
    /// Only updates fan out. A failed member lookup is logged and yields no
    /// requests.
    pub async fn handle(&self, event: WatchEvent<PrivateNetwork>) -> Vec<ObjectRef<NetworkInterface>> {
        let network = match event {
            WatchEvent::Updated { new, .. } => new,
            WatchEvent::Created(_) | WatchEvent::Deleted(_) => return Vec::new(),
        };
        let Some(name) = network.metadata.name.as_deref() else {
            return Vec::new();
        };

        let members = match self.store.list_network_interfaces(&member_selector(name)).await {
            Ok(members) => members,
            Err(e) => {
                error!("Failed to list members of PrivateNetwork {}: {}", name, e);
                return Vec::new();
            }
        };

        let requests = requests_for(&members);
        for request in &requests {
            debug!("PrivateNetwork {} changed, triggering {}", name, request);
        }
        self.metrics.record_fanout(requests.len());
        info!(
            "PrivateNetwork {} updated, triggered {} member NetworkInterfaces",
            name,
            requests.len()
        );
        requests
    }
}
