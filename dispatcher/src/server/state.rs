//! Server state

use std::sync::Arc;

use crate::queue::DeploymentQueue;
use crate::status::StatusStore;
use crate::webhook::signature::SignatureVerifier;

/// Server state shared across handlers
pub struct ServerState {
    pub verifier: SignatureVerifier,
    pub queue: DeploymentQueue,
    pub status: Arc<StatusStore>,
}

impl ServerState {
    pub fn new(verifier: SignatureVerifier, queue: DeploymentQueue, status: Arc<StatusStore>) -> Self {
        Self {
            verifier,
            queue,
            status,
        }
    }
}
