//! NetworkInterface reconciler

use super::plan::{desired_routes, plan, Phase, Plan, Step};
use super::Reconciler;
use crate::error::ControllerError;
use crate::scheduler::{ObjectKey, Outcome};
use crds::{NetworkInterface, NetworkInterfaceStatus, NETWORK_INTERFACE_FINALIZER};
use tracing::{debug, error, info, warn};

impl Reconciler {
    /// Run one pass over the NetworkInterface identified by `key`
    pub async fn reconcile_network_interface(&self, key: &ObjectKey) -> Result<Outcome, ControllerError> {
        let Some(nic) = self.store.get_network_interface(&key.name).await? else {
            debug!("NetworkInterface {} no longer exists, nothing to do", key);
            return Ok(Outcome::Done);
        };

        match plan(&nic, &self.settings)? {
            Phase::Foreign => {
                debug!(
                    "NetworkInterface {} is bound to node {}, skipping",
                    key, nic.spec.node_name
                );
                Ok(Outcome::Done)
            }
            Phase::AwaitingAddress => {
                debug!("NetworkInterface {} has no hardware address yet", key);
                Ok(Outcome::RequeueAfter(self.settings.awaiting_address_requeue))
            }
            Phase::Active(plan) => {
                info!("Reconciling NetworkInterface {}", key);
                self.execute(key, nic, plan).await
            }
        }
    }

    async fn execute(
        &self,
        key: &ObjectKey,
        mut nic: NetworkInterface,
        plan: Plan,
    ) -> Result<Outcome, ControllerError> {
        let mac = plan.mac_address.as_str();
        let mut released = false;

        for step in plan.steps {
            match step {
                Step::TearDownLink => {
                    info!("Tearing down link {} of NetworkInterface {}", mac, key);
                    if let Err(e) = self.links.tear_down_link(mac, &plan.address).await {
                        error!("Failed to tear down link {} of NetworkInterface {}: {}", mac, key, e);
                        return Err(e.into());
                    }
                }
                Step::ReleaseFinalizer => {
                    nic = self.release_finalizer(key, nic).await?;
                    released = true;
                }
                Step::VerifyAttached => self.verify_attached(key, mac).await?,
                Step::ResolveLinkName => {
                    nic = self.record_link_name(key, nic, mac, released).await?;
                }
                Step::ConfigureLink => {
                    if let Err(e) = self.links.configure_link(mac, &plan.address).await {
                        error!("Failed to configure link {} with {}: {}", mac, plan.address, e);
                        return Err(e.into());
                    }
                }
                Step::SyncRoutes => self.sync_routes(key, &nic, mac).await?,
            }
        }

        debug!("NetworkInterface {} reconciled", key);
        Ok(Outcome::Done)
    }

    async fn release_finalizer(
        &self,
        key: &ObjectKey,
        mut nic: NetworkInterface,
    ) -> Result<NetworkInterface, ControllerError> {
        if let Some(finalizers) = nic.metadata.finalizers.as_mut() {
            finalizers.retain(|f| f != NETWORK_INTERFACE_FINALIZER);
        }
        match self.store.update_network_interface(&nic).await {
            Ok(updated) => {
                info!("Removed finalizer from NetworkInterface {}", key);
                Ok(updated)
            }
            Err(e) => {
                warn!("Failed to remove finalizer from NetworkInterface {}: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn verify_attached(&self, key: &ObjectKey, mac: &str) -> Result<(), ControllerError> {
        let metadata = self.metadata.get_metadata().await.map_err(|e| {
            error!("Failed to fetch instance metadata: {}", e);
            ControllerError::Metadata(e)
        })?;
        if !metadata.has_private_nic(mac) {
            error!("NIC {} of NetworkInterface {} is not attached to this node", mac, key);
            return Err(ControllerError::NicNotFound(mac.to_string()));
        }
        Ok(())
    }

    /// Persist the host link name, skipping the write when status already has it
    ///
    /// A pass that just released the finalizer always writes, so a write
    /// against an object that is gone fails the pass.
    async fn record_link_name(
        &self,
        key: &ObjectKey,
        mut nic: NetworkInterface,
        mac: &str,
        force: bool,
    ) -> Result<NetworkInterface, ControllerError> {
        let link_name = self.links.get_link_name(mac).await.map_err(|e| {
            error!("Failed to resolve link name of {}: {}", mac, e);
            ControllerError::Link(e)
        })?;

        if !force && nic.link_name() == Some(link_name.as_str()) {
            debug!("NetworkInterface {} already records link {}", key, link_name);
            return Ok(nic);
        }

        nic.status
            .get_or_insert_with(NetworkInterfaceStatus::default)
            .link_name = Some(link_name.clone());
        match self.store.update_network_interface_status(&nic).await {
            Ok(updated) => {
                info!("NetworkInterface {} is bound to link {}", key, link_name);
                Ok(updated)
            }
            Err(e) => {
                warn!("Failed to update NetworkInterface {} status: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn sync_routes(&self, key: &ObjectKey, nic: &NetworkInterface, mac: &str) -> Result<(), ControllerError> {
        let network_name = nic
            .owner_network()
            .ok_or_else(|| ControllerError::MissingOwnerReference(key.name.clone()))?;

        let network = self
            .store
            .get_private_network(network_name)
            .await?
            .ok_or_else(|| ControllerError::PrivateNetworkNotFound(network_name.to_string()))?;

        let routes = desired_routes(&network)?;
        debug!(
            routes = routes.len(),
            "Syncing routes of link {} with PrivateNetwork {}", mac, network_name
        );
        if let Err(e) = self.links.sync_routes(mac, &routes).await {
            error!("Failed to sync routes of link {}: {}", mac, e);
            return Err(e.into());
        }
        Ok(())
    }
}
