//! Mock LinkSynchronizer for unit testing
//!
//! Records every call in order and answers link-name lookups from an in-memory
//! table. Individual operations can be made to fail.

use crate::error::LinkError;
use crate::link_trait::LinkSynchronizer;
use crate::route::Route;
use ipnet::IpNet;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Operation selector used for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkOp {
    TearDown,
    GetLinkName,
    Configure,
    SyncRoutes,
}

/// A recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCall {
    TearDown { mac: String, address: IpNet },
    GetLinkName { mac: String },
    Configure { mac: String, address: IpNet },
    SyncRoutes { mac: String, routes: Vec<Route> },
}

impl LinkCall {
    pub fn op(&self) -> LinkOp {
        match self {
            LinkCall::TearDown { .. } => LinkOp::TearDown,
            LinkCall::GetLinkName { .. } => LinkOp::GetLinkName,
            LinkCall::Configure { .. } => LinkOp::Configure,
            LinkCall::SyncRoutes { .. } => LinkOp::SyncRoutes,
        }
    }
}

/// Mock link synchronizer for testing
#[derive(Clone, Default)]
pub struct MockLinkSynchronizer {
    links: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<LinkCall>>>,
    failing: Arc<Mutex<HashSet<LinkOp>>>,
}

impl MockLinkSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host link carrying `mac` (for test setup)
    pub fn with_link(self, mac: &str, name: &str) -> Self {
        self.links
            .lock()
            .unwrap()
            .insert(mac.to_ascii_lowercase(), name.to_string());
        self
    }

    /// Make every subsequent call of `op` fail
    pub fn fail_on(&self, op: LinkOp) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Stop failing `op`
    pub fn recover(&self, op: LinkOp) {
        self.failing.lock().unwrap().remove(&op);
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<LinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Routes passed to the most recent `sync_routes` call
    pub fn last_synced_routes(&self) -> Option<Vec<Route>> {
        self.calls().into_iter().rev().find_map(|c| match c {
            LinkCall::SyncRoutes { routes, .. } => Some(routes),
            _ => None,
        })
    }

    fn record(&self, call: LinkCall) -> Result<(), LinkError> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(LinkError::Injected(format!("injected failure for {op:?}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LinkSynchronizer for MockLinkSynchronizer {
    async fn tear_down_link(&self, mac: &str, address: &IpNet) -> Result<(), LinkError> {
        self.record(LinkCall::TearDown {
            mac: mac.to_string(),
            address: *address,
        })
    }

    async fn get_link_name(&self, mac: &str) -> Result<String, LinkError> {
        self.record(LinkCall::GetLinkName {
            mac: mac.to_string(),
        })?;
        self.links
            .lock()
            .unwrap()
            .get(&mac.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| LinkError::LinkNotFound(mac.to_string()))
    }

    async fn configure_link(&self, mac: &str, address: &IpNet) -> Result<(), LinkError> {
        self.record(LinkCall::Configure {
            mac: mac.to_string(),
            address: *address,
        })
    }

    async fn sync_routes(&self, mac: &str, routes: &[Route]) -> Result<(), LinkError> {
        self.record(LinkCall::SyncRoutes {
            mac: mac.to_string(),
            routes: routes.to_vec(),
        })
    }
}
