//! NetworkInterface Controller
//!
//! Node-local controller for VPC private networking:
//! - NetworkInterface: binds a private NIC to its host link, configures its
//!   address and converges its routes
//! - PrivateNetwork: route changes are fanned out to every member
//!   NetworkInterface
//!
//! One instance runs per node and only acts on objects bound to that node.

mod backoff;
mod config;
mod controller;
mod error;
mod fanout;
mod metrics;
mod reconciler;
mod scheduler;
mod server;
mod store;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls transport needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting NetworkInterface Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Node: {}", config.node_name);
    info!("  Metadata URL: {}", config.metadata_url);
    info!("  Reconcile concurrency: {}", config.workers);
    info!(
        "  Backoff: {}s..{}s",
        config.backoff_min.as_secs(),
        config.backoff_max.as_secs()
    );
    info!("  Short-circuit after teardown: {}", config.short_circuit_after_teardown);
    info!("  Probe address: {}", config.metrics_addr);

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
