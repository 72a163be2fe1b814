//! Metadata API client
//!
//! Fetches the instance metadata document from `/conf?format=json` on the
//! link-local metadata endpoint.

use crate::error::MetadataError;
use crate::metadata_trait::MetadataProvider;
use crate::models::Metadata;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Metadata API client
pub struct MetadataClient {
    client: Client,
    base_url: String,
}

impl MetadataClient {
    /// Create a new metadata client
    ///
    /// # Arguments
    /// * `base_url` - Metadata endpoint (e.g., "http://169.254.42.42")
    pub fn new(base_url: String) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl MetadataProvider for MetadataClient {
    async fn get_metadata(&self) -> Result<Metadata, MetadataError> {
        let url = format!("{}/conf?format=json", self.base_url);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api(format!(
                "Failed to fetch metadata: {} - {}",
                status, body
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
