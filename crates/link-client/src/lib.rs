//! Host Link Client
//!
//! Drives the host side of a VPC private NIC: resolving the kernel link that
//! carries a hardware address, assigning its address, and converging its
//! routing table to a desired route set.
//!
//! # Example
//!
//! ```no_run
//! use link_client::{IpRouteLinks, LinkSynchronizer, Route};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let links = IpRouteLinks::new("ip");
//! let mac = "02:00:00:00:12:34";
//!
//! let name = links.get_link_name(mac).await?;
//! links.configure_link(mac, &"192.168.0.10/24".parse()?).await?;
//! links
//!     .sync_routes(mac, &[Route::new("10.0.0.0/24".parse()?, "192.168.0.1".parse()?)])
//!     .await?;
//! println!("configured {name}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod iproute;
pub mod models;
pub mod route;
pub mod runner;
#[path = "trait.rs"]
pub mod link_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use error::LinkError;
pub use iproute::IpRouteLinks;
pub use link_trait::LinkSynchronizer;
pub use route::{Route, RouteChanges};
pub use runner::{CommandRunner, IpCommand};
#[cfg(feature = "test-util")]
pub use mock::{LinkCall, LinkOp, MockLinkSynchronizer};
