//! Single-slot store for the current deployment status

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::models::deployment::{DeploymentState, DeploymentStatus};

/// Holds the status of the most recent deployment.
///
/// Written only by the deployment worker, read by the HTTP handlers. Readers
/// always get a full snapshot, never a half-updated record.
#[derive(Debug, Default)]
pub struct StatusStore {
    current: RwLock<Option<DeploymentStatus>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current status with a new `deploying` record
    pub async fn begin(&self, version: &str) -> DeploymentStatus {
        let status = DeploymentStatus::deploying(version);
        *self.current.write().await = Some(status.clone());
        status
    }

    /// Mark the current deployment as succeeded
    pub async fn succeed(&self) -> Option<DeploymentStatus> {
        self.finish(DeploymentState::Success, None).await
    }

    /// Mark the current deployment as failed with `error` as detail
    pub async fn fail(&self, error: impl Into<String>) -> Option<DeploymentStatus> {
        self.finish(DeploymentState::Failed, Some(error.into())).await
    }

    async fn finish(
        &self,
        state: DeploymentState,
        error: Option<String>,
    ) -> Option<DeploymentStatus> {
        let mut guard = self.current.write().await;
        let status = match guard.as_mut() {
            Some(status) if !status.is_terminal() => status,
            Some(status) => {
                warn!(
                    "Deployment {} already finished as {:?}, ignoring {:?}",
                    status.version, status.status, state
                );
                return None;
            }
            None => {
                warn!("No deployment in progress, ignoring {:?}", state);
                return None;
            }
        };

        status.status = state;
        status.error = error;
        status.end_time = Some(Utc::now());
        Some(status.clone())
    }

    /// Snapshot of the current status, if any deployment has started
    pub async fn current(&self) -> Option<DeploymentStatus> {
        self.current.read().await.clone()
    }
}
