//! Mock MetadataProvider for unit testing

use crate::error::MetadataError;
use crate::metadata_trait::MetadataProvider;
use crate::models::{Metadata, PrivateNic};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock metadata provider serving an in-memory document
#[derive(Clone, Default)]
pub struct MockMetadataProvider {
    metadata: Arc<Mutex<Metadata>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a private NIC with the given hardware address (for test setup)
    pub fn with_nic(self, mac: &str) -> Self {
        self.attach(mac);
        self
    }

    pub fn attach(&self, mac: &str) {
        self.metadata.lock().unwrap().private_nics.push(PrivateNic {
            mac_address: mac.to_string(),
            ..Default::default()
        });
    }

    pub fn detach(&self, mac: &str) {
        self.metadata
            .lock()
            .unwrap()
            .private_nics
            .retain(|nic| !nic.mac_address.eq_ignore_ascii_case(mac));
    }

    /// Make subsequent fetches fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetches so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn get_metadata(&self) -> Result<Metadata, MetadataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MetadataError::Api("injected metadata failure".to_string()));
        }
        Ok(self.metadata.lock().unwrap().clone())
    }
}
