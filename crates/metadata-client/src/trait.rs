//! MetadataProvider trait for mocking

use crate::error::MetadataError;
use crate::models::Metadata;

/// Source of the node's instance metadata
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch a fresh snapshot of the instance metadata
    async fn get_metadata(&self) -> Result<Metadata, MetadataError>;
}
