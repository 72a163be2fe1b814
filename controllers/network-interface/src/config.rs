//! Controller configuration read from the environment.

use crate::error::ControllerError;
use crate::reconciler::EngineSettings;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_METADATA_URL: &str = "http://169.254.42.42";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_AWAITING_ADDRESS_REQUEUE_SECS: u64 = 1;
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;
pub const DEFAULT_METRICS_PORT: u16 = 8080;
pub const DEFAULT_IP_BINARY: &str = "ip";

/// Runtime configuration of one node's controller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Identity of the node this instance runs on (`NODE_NAME`)
    pub node_name: String,
    /// Base URL of the instance metadata service (`METADATA_URL`)
    pub metadata_url: String,
    /// Number of concurrent reconcile workers (`RECONCILE_WORKERS`)
    pub workers: usize,
    /// Requeue delay while a NIC has no hardware address (`AWAITING_ADDRESS_REQUEUE_SECS`)
    pub awaiting_address_requeue: Duration,
    /// Backoff bounds for failed passes (`BACKOFF_MIN_SECS`, `BACKOFF_MAX_SECS`)
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    /// End the pass once the finalizer is released (`TEARDOWN_SHORT_CIRCUIT`)
    pub short_circuit_after_teardown: bool,
    /// Listen address of the probe and metrics server (`METRICS_ADDR`)
    pub metrics_addr: SocketAddr,
    /// Path or name of the iproute2 binary (`IP_BINARY`)
    pub ip_binary: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_name = lookup("NODE_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ControllerError::InvalidConfig("NODE_NAME environment variable is required".to_string())
            })?;

        let metadata_url = lookup("METADATA_URL").unwrap_or_else(|| DEFAULT_METADATA_URL.to_string());

        let workers: usize = parse_var(&lookup, "RECONCILE_WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_WORKERS must be at least 1".to_string(),
            ));
        }

        let awaiting_address_requeue = Duration::from_secs(parse_var(
            &lookup,
            "AWAITING_ADDRESS_REQUEUE_SECS",
            DEFAULT_AWAITING_ADDRESS_REQUEUE_SECS,
        )?);
        let backoff_min = Duration::from_secs(parse_var(&lookup, "BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS)?);
        let backoff_max = Duration::from_secs(parse_var(&lookup, "BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS)?);
        if backoff_min > backoff_max {
            return Err(ControllerError::InvalidConfig(format!(
                "BACKOFF_MIN_SECS ({}) exceeds BACKOFF_MAX_SECS ({})",
                backoff_min.as_secs(),
                backoff_max.as_secs()
            )));
        }

        let short_circuit_after_teardown = parse_var(&lookup, "TEARDOWN_SHORT_CIRCUIT", false)?;
        let metrics_addr = parse_var(
            &lookup,
            "METRICS_ADDR",
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_METRICS_PORT)),
        )?;
        let ip_binary = lookup("IP_BINARY").unwrap_or_else(|| DEFAULT_IP_BINARY.to_string());

        Ok(Self {
            node_name,
            metadata_url,
            workers,
            awaiting_address_requeue,
            backoff_min,
            backoff_max,
            short_circuit_after_teardown,
            metrics_addr,
            ip_binary,
        })
    }

    /// Settings handed to the reconciliation engine
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            node_name: self.node_name.clone(),
            awaiting_address_requeue: self.awaiting_address_requeue,
            short_circuit_after_teardown: self.short_circuit_after_teardown,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            ControllerError::InvalidConfig(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
    }
}
