//! Deployment worker draining the deployment queue

use std::future::Future;
use std::pin::Pin;

use tracing::{error, info, warn};

use crate::deploy::Deployer;
use crate::queue::DeploymentReceiver;
use crate::status::StatusStore;

/// Run the deployment worker.
///
/// Deploys queued versions one at a time in queue order. Exits when
/// `shutdown_signal` resolves (after the in-flight deployment, if any) or when
/// every producer handle has been dropped and the queue is drained.
pub async fn run(
    mut queue: DeploymentReceiver,
    deployer: &dyn Deployer,
    status: &StatusStore,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!(
        "Deployment worker started (environment: {})",
        deployer.environment()
    );

    loop {
        let version = tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                queue.close();
                if !queue.is_empty() {
                    warn!(
                        "Deployment worker shutting down, discarding {} queued deployment(s)",
                        queue.len()
                    );
                }
                info!("Deployment worker shutting down...");
                return;
            }
            next = queue.dequeue() => match next {
                Some(version) => version,
                None => {
                    info!("Deployment queue closed, worker exiting");
                    return;
                }
            },
        };

        deploy_version(&version, deployer, status).await;
    }
}

/// Deploy a single version and record the outcome
pub async fn deploy_version(version: &str, deployer: &dyn Deployer, status: &StatusStore) {
    info!("Starting deployment for version: {}", version);
    status.begin(version).await;

    match deployer.deploy(version).await {
        Ok(()) => {
            let finished = status.succeed().await;
            match finished.and_then(|s| s.duration()) {
                Some(took) => info!(
                    "Deployment completed successfully: {} (took {}ms)",
                    version,
                    took.num_milliseconds()
                ),
                None => info!("Deployment completed successfully: {}", version),
            }
        }
        Err(e) => {
            error!("Deployment failed: {}: {}", version, e);
            status.fail(e.to_string()).await;
        }
    }
}
