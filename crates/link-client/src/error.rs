//! Link client errors

use thiserror::Error;

/// Errors that can occur while inspecting or changing host links
#[derive(Debug, Error)]
pub enum LinkError {
    /// The `ip` binary could not be spawned
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("{command} exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// The command output could not be decoded
    #[error("failed to decode output of {command}: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// No host link carries the requested hardware address
    #[error("no link found with hardware address {0}")]
    LinkNotFound(String),

    /// A value reported by the kernel could not be parsed
    #[error("invalid value reported for {link}: {value}")]
    InvalidValue { link: String, value: String },

    /// Injected by the test mock
    #[error("{0}")]
    Injected(String),
}
