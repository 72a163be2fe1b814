//! Resource store access.
//!
//! The engine and the fan-out talk to the control plane through
//! [`ResourceStore`]; [`KubeStore`] implements it on top of `kube::Api`.
//! Every write carries the object's `resourceVersion`, so a concurrent
//! modification surfaces as [`StoreError::Conflict`].

use async_trait::async_trait;
use crds::{NetworkInterface, PrivateNetwork};
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, ResourceExt};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Errors from resource store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist (only reported for writes)
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    /// The write lost an optimistic concurrency race
    #[error("Conflicting update to {kind} {name}")]
    Conflict { kind: &'static str, name: String },

    /// Any other API failure
    #[error("Kubernetes API error: {0}")]
    Kube(#[source] kube::Error),

    /// The object to write has no name
    #[error("{0} has no name")]
    Unnamed(&'static str),
}

impl StoreError {
    fn from_kube(err: kube::Error, kind: &'static str, name: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict {
                kind,
                name: name.to_string(),
            },
            kube::Error::Api(ae) if ae.code == 404 => StoreError::NotFound {
                kind,
                name: name.to_string(),
            },
            e => StoreError::Kube(e),
        }
    }
}

/// Typed access to `NetworkInterface` and `PrivateNetwork` objects.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a `NetworkInterface`, `None` if it does not exist
    async fn get_network_interface(&self, name: &str) -> Result<Option<NetworkInterface>, StoreError>;

    /// Persist object metadata (finalizers) with an optimistic precondition
    async fn update_network_interface(&self, nic: &NetworkInterface) -> Result<NetworkInterface, StoreError>;

    /// Persist the status subresource with an optimistic precondition
    async fn update_network_interface_status(
        &self,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface, StoreError>;

    /// Fetch a `PrivateNetwork`, `None` if it does not exist
    async fn get_private_network(&self, name: &str) -> Result<Option<PrivateNetwork>, StoreError>;

    /// List `NetworkInterface` objects matching a label selector
    async fn list_network_interfaces(&self, label_selector: &str) -> Result<Vec<NetworkInterface>, StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    interfaces: Api<NetworkInterface>,
    networks: Api<PrivateNetwork>,
}

impl KubeStore {
    pub fn new(interfaces: Api<NetworkInterface>, networks: Api<PrivateNetwork>) -> Self {
        Self { interfaces, networks }
    }
}

const NIC_KIND: &str = "NetworkInterface";

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_network_interface(&self, name: &str) -> Result<Option<NetworkInterface>, StoreError> {
        self.interfaces
            .get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube(e, NIC_KIND, name))
    }

    async fn update_network_interface(&self, nic: &NetworkInterface) -> Result<NetworkInterface, StoreError> {
        let name = nic.metadata.name.as_deref().ok_or(StoreError::Unnamed(NIC_KIND))?;
        debug!(
            resource_version = ?nic.resource_version(),
            finalizers = ?nic.finalizers(),
            "Updating NetworkInterface {}",
            name
        );
        // `replace` sends the resourceVersion along, the API server rejects stale writes with 409
        self.interfaces
            .replace(name, &PostParams::default(), nic)
            .await
            .map_err(|e| StoreError::from_kube(e, NIC_KIND, name))
    }

    async fn update_network_interface_status(
        &self,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface, StoreError> {
        let name = nic.metadata.name.as_deref().ok_or(StoreError::Unnamed(NIC_KIND))?;
        debug!(
            resource_version = ?nic.resource_version(),
            "Updating NetworkInterface {} status",
            name
        );
        let patch = json!({
            "metadata": {
                "resourceVersion": nic.resource_version(),
            },
            "status": nic.status,
        });
        self.interfaces
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube(e, NIC_KIND, name))
    }

    async fn get_private_network(&self, name: &str) -> Result<Option<PrivateNetwork>, StoreError> {
        self.networks
            .get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube(e, "PrivateNetwork", name))
    }

    async fn list_network_interfaces(&self, label_selector: &str) -> Result<Vec<NetworkInterface>, StoreError> {
        let list = self
            .interfaces
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(StoreError::Kube)?;
        Ok(list.items)
    }
}
