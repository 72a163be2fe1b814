//! PrivateNetwork watch.
//!
//! NetworkInterface objects are watched by the controller itself. This module
//! watches PrivateNetwork objects, keeps their last seen copies in a reflector
//! store and turns each change into a typed [`WatchEvent`] carrying the
//! before/after snapshots. The fan-out expands updates into NetworkInterface
//! requests that are fed to the controller as extra triggers.

use crate::fanout::FanOut;
use crate::server::Readiness;
use crds::{NetworkInterface, PrivateNetwork};
use futures::{future, stream, Stream, StreamExt};
use kube::Api;
use kube_runtime::reflector::{self, store::Writer, ObjectRef, Store};
use kube_runtime::watcher::{self, Event};
use kube_runtime::WatchStreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A change to one object.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<K> {
    Created(K),
    Updated { old: K, new: K },
    Deleted(K),
}

impl<K> WatchEvent<K> {
    /// The object as it stands after the event
    pub fn object(&self) -> &K {
        match self {
            WatchEvent::Created(obj) | WatchEvent::Deleted(obj) => obj,
            WatchEvent::Updated { new, .. } => new,
        }
    }
}

/// Last seen copy of every PrivateNetwork.
///
/// During a re-list the store keeps serving the previous state until the list
/// completes, so objects that changed while disconnected are reported as
/// updates. Copies with an unchanged `resourceVersion` produce nothing.
pub struct NetworkSnapshots {
    reader: Store<PrivateNetwork>,
    writer: Writer<PrivateNetwork>,
}

impl Default for NetworkSnapshots {
    fn default() -> Self {
        let (reader, writer) = reflector::store();
        Self { reader, writer }
    }
}

impl NetworkSnapshots {
    /// Record one raw watch event and report what changed
    pub fn observe(&mut self, event: Event<PrivateNetwork>) -> Option<WatchEvent<PrivateNetwork>> {
        let change = match &event {
            Event::Apply(network) | Event::InitApply(network) => {
                match self.reader.get(&ObjectRef::from_obj(network)) {
                    None => Some(WatchEvent::Created(network.clone())),
                    Some(old) if old.metadata.resource_version == network.metadata.resource_version => None,
                    Some(old) => Some(WatchEvent::Updated {
                        old: old.as_ref().clone(),
                        new: network.clone(),
                    }),
                }
            }
            Event::Delete(network) => Some(WatchEvent::Deleted(network.clone())),
            Event::Init | Event::InitDone => None,
        };
        self.writer.apply_watcher_event(&event);
        change
    }
}

/// NetworkInterface requests triggered by PrivateNetwork changes
///
/// Marks the networks as synced once the first list completes.
pub fn network_triggers(
    networks: Api<PrivateNetwork>,
    fanout: Arc<FanOut>,
    readiness: Readiness,
) -> impl Stream<Item = ObjectRef<NetworkInterface>> + Send + 'static {
    info!("Starting PrivateNetwork watcher");

    let mut snapshots = NetworkSnapshots::default();
    watcher::watcher(networks, watcher::Config::default())
        .default_backoff()
        .filter_map(move |event| {
            let change = match event {
                Ok(event) => {
                    if matches!(event, Event::InitDone) {
                        info!("PrivateNetwork initial list complete");
                        readiness.mark_networks_synced();
                    }
                    snapshots.observe(event)
                }
                Err(e) => {
                    warn!("PrivateNetwork watch error (retrying): {}", e);
                    None
                }
            };
            future::ready(change)
        })
        .then(move |change| {
            let fanout = fanout.clone();
            async move {
                debug!(
                    "PrivateNetwork event for {:?}",
                    change.object().metadata.name.as_deref()
                );
                fanout.handle(change).await
            }
        })
        .flat_map(stream::iter)
}
