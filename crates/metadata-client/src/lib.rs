//! Instance Metadata Client
//!
//! Reads the instance metadata document served on the link-local metadata
//! endpoint and exposes the private NICs currently attached to this node.
//!
//! # Example
//!
//! ```no_run
//! use metadata_client::{MetadataClient, MetadataProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MetadataClient::new("http://169.254.42.42".to_string())?;
//! let metadata = client.get_metadata().await?;
//! for nic in &metadata.private_nics {
//!     println!("{}", nic.mac_address);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod metadata_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::MetadataClient;
pub use error::MetadataError;
pub use metadata_trait::MetadataProvider;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::MockMetadataProvider;
