//! Request scheduling.
//!
//! Requests are queued, deduplicated and handed to workers by
//! `kube_runtime::Controller`. This module adapts the engine to it: the
//! per-key request identity, the pass outcome, and the reconcile and error
//! policy functions the controller runs.

pub mod policy;

use crate::error::ControllerError;
use async_trait::async_trait;
use kube::Resource;
use kube_runtime::controller::Action;
use std::fmt;
use std::time::Duration;

pub use policy::{error_policy, reconcile, Context};

/// Identity of a queued request.
///
/// Both reconciled kinds are cluster-scoped, so `namespace` is empty in
/// practice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    /// Key of a cluster-scoped object
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
        }
    }

    /// Key of an observed object, `None` when it carries no name
    pub fn for_resource<K: Resource>(obj: &K) -> Option<Self> {
        let meta = obj.meta();
        Some(Self {
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone()?,
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Successful result of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing more to do until the next event
    Done,
    /// Run the pass again after the delay, without counting a failure
    RequeueAfter(Duration),
}

impl From<Outcome> for Action {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => Action::await_change(),
            Outcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

/// A reconciliation pass over one key.
#[async_trait]
pub trait ReconcileHandler: Send + Sync {
    async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome, ControllerError>;
}
