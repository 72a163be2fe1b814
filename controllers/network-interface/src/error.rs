//! Controller-specific error types.
//!
//! This module defines the errors surfaced by a reconciliation pass and maps
//! each of them onto the retry class the scheduler acts on.

use crate::store::StoreError;
use kube::Error as KubeError;
use link_client::LinkError;
use metadata_client::MetadataError;
use thiserror::Error;

/// Errors that can occur in the NetworkInterface Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client error outside of store operations
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Resource store read or write failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Host link operation failed
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Instance metadata could not be read
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// The NIC's hardware address is not attached to this node
    #[error("nic {0} not found on node")]
    NicNotFound(String),

    /// `spec.address` is not a valid CIDR address
    #[error("Invalid address {value} on NetworkInterface {name}")]
    InvalidAddress { name: String, value: String },

    /// A route of the owning PrivateNetwork could not be parsed
    #[error("Invalid route {field} {value} in PrivateNetwork {network}")]
    InvalidRoute {
        network: String,
        field: &'static str,
        value: String,
    },

    /// The NetworkInterface carries no PrivateNetwork owner reference
    #[error("NetworkInterface {0} has no PrivateNetwork owner reference")]
    MissingOwnerReference(String),

    /// The owning PrivateNetwork does not exist
    #[error("PrivateNetwork not found: {0}")]
    PrivateNetworkNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probe server error
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

/// How the scheduler retries a failed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Collaborator failure, retried with backoff
    Transient,
    /// Malformed or inconsistent declared state, retried with backoff until an operator fixes it
    Data,
    /// Optimistic update lost a race, the whole pass is redone immediately
    Conflict,
}

impl ControllerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ControllerError::Store(StoreError::Conflict { .. }) => ErrorClass::Conflict,
            ControllerError::NicNotFound(_)
            | ControllerError::InvalidAddress { .. }
            | ControllerError::InvalidRoute { .. }
            | ControllerError::MissingOwnerReference(_)
            | ControllerError::PrivateNetworkNotFound(_)
            | ControllerError::InvalidConfig(_) => ErrorClass::Data,
            _ => ErrorClass::Transient,
        }
    }
}
