//! Command runner abstraction for invoking `ip`(8).
//!
//! `CommandRunner` is the seam the iproute2 backend executes through.
//! `IpCommand` is the production implementation that spawns the `ip` binary.

use crate::error::LinkError;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::trace;

/// Runs one `ip` invocation and returns its standard output.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<String, LinkError>;
}

/// Production runner spawning the `ip` binary.
#[derive(Debug, Clone)]
pub struct IpCommand {
    binary: PathBuf,
}

impl IpCommand {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary.display(), args.join(" "))
    }
}

#[async_trait::async_trait]
impl CommandRunner for IpCommand {
    async fn run(&self, args: &[String]) -> Result<String, LinkError> {
        let command = self.describe(args);
        trace!(%command, "running");

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|source| LinkError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(LinkError::Command {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
