//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the store, the
//! host link and metadata clients, the PrivateNetwork fan-out and the probe
//! server around a `kube_runtime::Controller` for NetworkInterface objects,
//! and runs them until shutdown.

use crate::backoff::{FibonacciBackoff, Retries};
use crate::config::Config;
use crate::error::ControllerError;
use crate::fanout::FanOut;
use crate::metrics::Metrics;
use crate::reconciler::Reconciler;
use crate::scheduler::{error_policy, reconcile, Context};
use crate::server::{self, ProbeState, Readiness};
use crate::store::KubeStore;
use crate::watcher::network_triggers;
use crds::{NetworkInterface, PrivateNetwork};
use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::controller::{self, Config as ControllerConfig};
use kube_runtime::watcher;
use link_client::IpRouteLinks;
use metadata_client::MetadataClient;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Main controller for node-local NetworkInterface management.
pub struct Controller {
    runtime: kube_runtime::Controller<NetworkInterface>,
    context: Arc<Context>,
    readiness: Readiness,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing NetworkInterface Controller for node {}", config.node_name);

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;
        let interfaces: Api<NetworkInterface> = Api::all(kube_client.clone());
        let networks: Api<PrivateNetwork> = Api::all(kube_client);

        let store = Arc::new(KubeStore::new(interfaces.clone(), networks.clone()));
        let links = Arc::new(IpRouteLinks::new(&config.ip_binary));
        let metadata = Arc::new(MetadataClient::new(config.metadata_url.clone())?);
        let metrics = Arc::new(Metrics::new()?);
        let readiness = Readiness::default();

        let reconciler = Arc::new(Reconciler::new(
            config.engine_settings(),
            store.clone(),
            links,
            metadata,
        ));
        let context = Arc::new(Context::new(
            reconciler,
            Retries::new(FibonacciBackoff::new(config.backoff_min, config.backoff_max)),
            metrics.clone(),
        ));

        let fanout = Arc::new(FanOut::new(store, metrics.clone()));
        let triggers = network_triggers(networks, fanout, readiness.clone());

        // Concurrency bounds passes across keys; a key never runs twice at once
        let runtime = kube_runtime::Controller::new(interfaces, watcher::Config::default())
            .with_config(
                ControllerConfig::default().concurrency(u16::try_from(config.workers).unwrap_or(u16::MAX)),
            )
            .reconcile_on(triggers)
            .shutdown_on_signal();

        let probe_server = tokio::spawn(server::serve(
            config.metrics_addr,
            ProbeState {
                readiness: readiness.clone(),
                metrics,
            },
        ));

        Ok(Self {
            runtime,
            context,
            readiness,
            probe_server,
        })
    }

    /// Runs the controller until a shutdown signal or a probe server failure.
    ///
    /// On SIGINT or SIGTERM no new passes start and in-flight passes finish.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("NetworkInterface Controller running");

        let interfaces = self.runtime.store();
        let readiness = self.readiness.clone();
        let synced = tokio::spawn(async move {
            if interfaces.wait_until_ready().await.is_ok() {
                info!("NetworkInterface initial list complete");
                readiness.mark_interfaces_synced();
            }
        });

        let reconciles = self
            .runtime
            .run(reconcile, error_policy, self.context)
            .for_each(log_reconcile_result);

        let result = tokio::select! {
            () = reconciles => {
                info!("Shutdown signal received, reconcile loop drained");
                Ok(())
            }
            result = &mut self.probe_server => {
                flatten(result, "Probe server")
            }
        };

        synced.abort();
        self.probe_server.abort();
        info!("NetworkInterface Controller stopped");

        result
    }
}

fn log_reconcile_result<T: Debug, E: std::error::Error + 'static>(
    result: Result<T, controller::Error<ControllerError, E>>,
) -> std::future::Ready<()> {
    match result {
        Ok(reconciled) => debug!(?reconciled, "NetworkInterface reconciliation completed"),
        // Already logged with its retry delay by the error policy
        Err(controller::Error::ReconcilerFailed(..)) => {}
        Err(e) => error!(error = %e, "NetworkInterface controller error"),
    }
    std::future::ready(())
}

fn flatten(
    result: Result<Result<(), ControllerError>, tokio::task::JoinError>,
    task: &str,
) -> Result<(), ControllerError> {
    result
        .map_err(|e| ControllerError::Watch(format!("{} panicked: {}", task, e)))?
        .map_err(|e| ControllerError::Watch(format!("{} error: {}", task, e)))
}
