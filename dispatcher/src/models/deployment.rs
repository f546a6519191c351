//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    Deploying,
    Success,
    Failed,
}

impl DeploymentState {
    /// `success` and `failed` never change again for the same deployment
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Success | DeploymentState::Failed)
    }
}

/// Status of the most recent deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Version being deployed
    pub version: String,

    pub status: DeploymentState,

    pub start_time: DateTime<Utc>,

    /// Set once the deployment reaches a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Failure detail, only present when `status` is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentStatus {
    /// A freshly dequeued deployment
    pub fn deploying(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            status: DeploymentState::Deploying,
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Time between start and end, once terminal
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}
