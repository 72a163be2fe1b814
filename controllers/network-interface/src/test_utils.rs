//! Test utilities for unit testing the reconciler and fan-out
//!
//! Builders for test objects and an in-memory [`ResourceStore`] that enforces
//! `resourceVersion` preconditions the way the API server does.

use crate::store::{ResourceStore, StoreError};
use async_trait::async_trait;
use crds::{
    NetworkInterface, NetworkInterfaceSpec, NetworkInterfaceStatus, PrivateNetwork, PrivateNetworkSpec,
    RouteSpec, NETWORK_INTERFACE_FINALIZER, PRIVATE_NETWORK_LABEL,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference, Time};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const NODE: &str = "node-a";
pub const OTHER_NODE: &str = "node-b";
pub const MAC: &str = "02:00:00:00:00:01";
pub const NETWORK: &str = "pn-1";

/// Helper to create a test NetworkInterface owned by `network`
pub fn create_test_network_interface(name: &str, node: &str, address: &str, network: &str) -> NetworkInterface {
    NetworkInterface {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([(
                PRIVATE_NETWORK_LABEL.to_string(),
                network.to_string(),
            )])),
            owner_references: Some(vec![OwnerReference {
                api_version: "vpc.scaleway.com/v1alpha1".to_string(),
                kind: PrivateNetwork::KIND.to_string(),
                name: network.to_string(),
                uid: format!("uid-{}", network),
                controller: Some(true),
                ..Default::default()
            }]),
            finalizers: Some(vec![NETWORK_INTERFACE_FINALIZER.to_string()]),
            ..Default::default()
        },
        spec: NetworkInterfaceSpec {
            node_name: node.to_string(),
            address: address.to_string(),
        },
        status: None,
    }
}

/// Helper to create an attached NetworkInterface on the local node
pub fn create_attached_network_interface(name: &str) -> NetworkInterface {
    with_mac(create_test_network_interface(name, NODE, "192.168.0.10/24", NETWORK), MAC)
}

pub fn with_mac(mut nic: NetworkInterface, mac: &str) -> NetworkInterface {
    nic.status.get_or_insert_with(NetworkInterfaceStatus::default).mac_address = Some(mac.to_string());
    nic
}

pub fn with_link_name(mut nic: NetworkInterface, link: &str) -> NetworkInterface {
    nic.status.get_or_insert_with(NetworkInterfaceStatus::default).link_name = Some(link.to_string());
    nic
}

pub fn terminating(mut nic: NetworkInterface) -> NetworkInterface {
    nic.metadata.deletion_timestamp = Some(Time(Default::default()));
    nic
}

pub fn without_finalizer(mut nic: NetworkInterface) -> NetworkInterface {
    nic.metadata.finalizers = None;
    nic
}

/// Helper to create a test PrivateNetwork with `(to, via)` routes
pub fn create_test_private_network(name: &str, routes: &[(&str, &str)]) -> PrivateNetwork {
    PrivateNetwork::new(
        name,
        PrivateNetworkSpec {
            id: Some(format!("id-{}", name)),
            routes: routes
                .iter()
                .map(|(to, via)| RouteSpec {
                    to: to.to_string(),
                    via: via.to_string(),
                })
                .collect(),
        },
    )
}

/// A write the [`MockStore`] received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Update(String),
    UpdateStatus(String),
}

#[derive(Default)]
struct MockStoreState {
    interfaces: BTreeMap<String, NetworkInterface>,
    networks: BTreeMap<String, PrivateNetwork>,
    writes: Vec<StoreWrite>,
    lists: Vec<String>,
    pending_conflicts: usize,
    failing_lists: bool,
    next_version: u64,
}

impl MockStoreState {
    fn bump(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

/// In-memory resource store
///
/// Objects get a fresh `resourceVersion` on every successful write, and a
/// terminating object whose last finalizer is removed disappears, like on the
/// API server.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockStoreState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network_interface(self, mut nic: NetworkInterface) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            nic.metadata.resource_version = Some(state.bump());
            state.interfaces.insert(nic.metadata.name.clone().unwrap(), nic);
        }
        self
    }

    pub fn with_private_network(self, mut network: PrivateNetwork) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            network.metadata.resource_version = Some(state.bump());
            state.networks.insert(network.metadata.name.clone().unwrap(), network);
        }
        self
    }

    /// Replace a stored NetworkInterface, as another writer would
    pub fn put_network_interface(&self, nic: NetworkInterface) {
        let _ = self.clone().with_network_interface(nic);
    }

    pub fn put_private_network(&self, network: PrivateNetwork) {
        let _ = self.clone().with_private_network(network);
    }

    pub fn network_interface(&self, name: &str) -> Option<NetworkInterface> {
        self.state.lock().unwrap().interfaces.get(name).cloned()
    }

    /// Fail the next `n` writes with a conflict
    pub fn inject_conflicts(&self, n: usize) {
        self.state.lock().unwrap().pending_conflicts = n;
    }

    pub fn set_lists_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing_lists = failing;
    }

    /// Every write attempt, successful or not
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn status_writes(&self) -> usize {
        self.writes()
            .iter()
            .filter(|w| matches!(w, StoreWrite::UpdateStatus(_)))
            .count()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    /// Label selectors passed to `list_network_interfaces`
    pub fn lists(&self) -> Vec<String> {
        self.state.lock().unwrap().lists.clone()
    }

    fn check_write(state: &mut MockStoreState, nic: &NetworkInterface) -> Result<String, StoreError> {
        let name = nic.metadata.name.clone().ok_or(StoreError::Unnamed("NetworkInterface"))?;
        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(StoreError::Conflict {
                kind: "NetworkInterface",
                name,
            });
        }
        let stored = state.interfaces.get(&name).ok_or_else(|| StoreError::NotFound {
            kind: "NetworkInterface",
            name: name.clone(),
        })?;
        if stored.metadata.resource_version != nic.metadata.resource_version {
            return Err(StoreError::Conflict {
                kind: "NetworkInterface",
                name,
            });
        }
        Ok(name)
    }
}

fn matches_selector(nic: &NetworkInterface, selector: &str) -> bool {
    let labels = nic.metadata.labels.clone().unwrap_or_default();
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key).map(String::as_str) == Some(value),
            None => labels.contains_key(term),
        })
}

#[async_trait]
impl ResourceStore for MockStore {
    async fn get_network_interface(&self, name: &str) -> Result<Option<NetworkInterface>, StoreError> {
        Ok(self.network_interface(name))
    }

    async fn update_network_interface(&self, nic: &NetworkInterface) -> Result<NetworkInterface, StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .writes
            .push(StoreWrite::Update(nic.metadata.name.clone().unwrap_or_default()));
        let name = Self::check_write(&mut state, nic)?;

        let stored_status = state.interfaces.get(&name).and_then(|n| n.status.clone());
        let mut updated = nic.clone();
        updated.status = stored_status;
        updated.metadata.resource_version = Some(state.bump());

        let finalizers_empty = updated.metadata.finalizers.as_ref().is_none_or(|f| f.is_empty());
        if updated.metadata.deletion_timestamp.is_some() && finalizers_empty {
            state.interfaces.remove(&name);
        } else {
            state.interfaces.insert(name, updated.clone());
        }
        Ok(updated)
    }

    async fn update_network_interface_status(
        &self,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface, StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .writes
            .push(StoreWrite::UpdateStatus(nic.metadata.name.clone().unwrap_or_default()));
        let name = Self::check_write(&mut state, nic)?;

        let mut updated = state.interfaces.get(&name).cloned().unwrap();
        updated.status = nic.status.clone();
        updated.metadata.resource_version = Some(state.bump());
        state.interfaces.insert(name, updated.clone());
        Ok(updated)
    }

    async fn get_private_network(&self, name: &str) -> Result<Option<PrivateNetwork>, StoreError> {
        Ok(self.state.lock().unwrap().networks.get(name).cloned())
    }

    async fn list_network_interfaces(&self, label_selector: &str) -> Result<Vec<NetworkInterface>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.lists.push(label_selector.to_string());
        if state.failing_lists {
            let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            return Err(StoreError::Kube(kube::Error::SerdeError(decode)));
        }
        Ok(state
            .interfaces
            .values()
            .filter(|nic| matches_selector(nic, label_selector))
            .cloned()
            .collect())
    }
}

pub const LINK: &str = "ens5";

/// A reconciler wired to in-memory collaborators
pub struct TestHarness {
    pub reconciler: crate::reconciler::Reconciler,
    pub store: MockStore,
    pub links: link_client::MockLinkSynchronizer,
    pub metadata: metadata_client::MockMetadataProvider,
}

/// Helper to create a reconciler for `NODE` whose host has `MAC` attached as `LINK`
pub fn create_test_reconciler(store: MockStore, short_circuit_after_teardown: bool) -> TestHarness {
    let links = link_client::MockLinkSynchronizer::new().with_link(MAC, LINK);
    let metadata = metadata_client::MockMetadataProvider::new().with_nic(MAC);
    let settings = crate::reconciler::EngineSettings {
        node_name: NODE.to_string(),
        awaiting_address_requeue: std::time::Duration::from_secs(1),
        short_circuit_after_teardown,
    };
    let reconciler = crate::reconciler::Reconciler::new(
        settings,
        Arc::new(store.clone()),
        Arc::new(links.clone()),
        Arc::new(metadata.clone()),
    );
    TestHarness {
        reconciler,
        store,
        links,
        metadata,
    }
}
