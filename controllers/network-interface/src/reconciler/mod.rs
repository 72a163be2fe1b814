//! Reconciliation engine for NetworkInterface objects.
//!
//! - `plan`: pure mapping from an observed object to the steps of a pass
//! - `network_interface`: executes those steps against the store, the host
//!   links and the instance metadata

pub mod network_interface;
pub mod plan;

#[cfg(test)]
mod network_interface_test;

use crate::error::ControllerError;
use crate::scheduler::{ObjectKey, Outcome, ReconcileHandler};
use crate::store::ResourceStore;
use async_trait::async_trait;
use link_client::LinkSynchronizer;
use metadata_client::MetadataProvider;
use std::sync::Arc;
use std::time::Duration;

/// Engine settings derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Identity of the local node
    pub node_name: String,
    /// Requeue delay while a NIC has no hardware address
    pub awaiting_address_requeue: Duration,
    /// End the pass once the finalizer is released
    pub short_circuit_after_teardown: bool,
}

/// Reconciles NetworkInterface objects bound to the local node.
pub struct Reconciler {
    pub(crate) settings: EngineSettings,
    pub(crate) store: Arc<dyn ResourceStore>,
    pub(crate) links: Arc<dyn LinkSynchronizer>,
    pub(crate) metadata: Arc<dyn MetadataProvider>,
}

impl Reconciler {
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn ResourceStore>,
        links: Arc<dyn LinkSynchronizer>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            settings,
            store,
            links,
            metadata,
        }
    }
}

#[async_trait]
impl ReconcileHandler for Reconciler {
    async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome, ControllerError> {
        self.reconcile_network_interface(key).await
    }
}
