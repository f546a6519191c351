//! Deploy script executor

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::deploy::Deployer;
use crate::errors::DispatchError;

/// Invokes `<script> <version> <environment>`.
///
/// The script's stdout and stderr are inherited so its output shows up next to
/// the dispatcher's own logs. Only the exit code is interpreted.
#[derive(Debug, Clone)]
pub struct ScriptDeployer {
    script: PathBuf,
    environment: String,
    timeout: Option<Duration>,
}

impl ScriptDeployer {
    pub fn new(script: impl Into<PathBuf>, environment: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            environment: environment.into(),
            timeout: None,
        }
    }

    /// Kill the script and fail the deployment after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

#[async_trait]
impl Deployer for ScriptDeployer {
    async fn deploy(&self, version: &str) -> Result<(), DispatchError> {
        info!(
            "Executing: {} {} {}",
            self.script.display(),
            version,
            self.environment
        );

        let mut child = Command::new(&self.script)
            .arg(version)
            .arg(&self.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DispatchError::DeployError(format!(
                    "Failed to run deploy script {}: {}",
                    self.script.display(),
                    e
                ))
            })?;

        let status = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    // Dropping the child kills it, but reap it explicitly
                    let _ = child.kill().await;
                    return Err(DispatchError::DeployError(format!(
                        "Deployment timed out after {:?}",
                        timeout
                    )));
                }
            },
            None => child.wait().await?,
        };

        debug!("Deploy script for {} finished with {}", version, status);

        if !status.success() {
            return Err(DispatchError::DeployError(format!(
                "Deploy script {}",
                status
            )));
        }
        Ok(())
    }

    fn environment(&self) -> &str {
        &self.environment
    }
}
