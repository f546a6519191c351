//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::deploy::Deployer;
use crate::errors::DispatchError;
use crate::queue::{self, DeploymentQueue, DeploymentReceiver};
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::status::StatusStore;
use crate::webhook::signature::SignatureVerifier;
use crate::workers::deployer;

/// Run the release dispatcher until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    verifier: SignatureVerifier,
    deployer: Arc<dyn Deployer>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DispatchError> {
    info!("Initializing release dispatcher...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(
        &options,
        verifier,
        deployer,
        &shutdown_tx,
        &mut shutdown_manager,
    )
    .await
    {
        error!("Failed to start dispatcher: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    verifier: SignatureVerifier,
    deployer: Arc<dyn Deployer>,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), DispatchError> {
    let (queue, receiver) = queue::channel(options.queue_capacity);
    let status = Arc::new(StatusStore::new());

    init_deployment_worker(
        receiver,
        deployer,
        status.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_webhook_server(
        options,
        verifier,
        queue,
        status,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await
}

fn init_deployment_worker(
    receiver: DeploymentReceiver,
    deployer: Arc<dyn Deployer>,
    status: Arc<StatusStore>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DispatchError> {
    info!("Initializing deployment worker...");

    let worker_handle = tokio::spawn(async move {
        deployer::run(
            receiver,
            deployer.as_ref(),
            status.as_ref(),
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_deployment_worker_handle(worker_handle)
}

async fn init_webhook_server(
    options: &AppOptions,
    verifier: SignatureVerifier,
    queue: DeploymentQueue,
    status: Arc<StatusStore>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DispatchError> {
    info!("Initializing webhook server...");

    let server_state = ServerState::new(verifier, queue, status);

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_webhook_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    webhook_server_handle: Option<JoinHandle<Result<(), DispatchError>>>,
    deployment_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            webhook_server_handle: None,
            deployment_worker_handle: None,
        }
    }

    pub fn with_deployment_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), DispatchError> {
        if self.deployment_worker_handle.is_some() {
            return Err(DispatchError::ShutdownError(
                "deployment_worker_handle already set".to_string(),
            ));
        }
        self.deployment_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_webhook_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), DispatchError>>,
    ) -> Result<(), DispatchError> {
        if self.webhook_server_handle.is_some() {
            return Err(DispatchError::ShutdownError(
                "webhook_server_handle already set".to_string(),
            ));
        }
        self.webhook_server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), DispatchError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                // An in-flight deploy script cannot be interrupted from here
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DispatchError> {
        info!("Shutting down release dispatcher...");

        // 1. Stop accepting webhooks
        if let Some(handle) = self.webhook_server_handle.take() {
            handle
                .await
                .map_err(|e| DispatchError::ShutdownError(e.to_string()))??;
        }

        // 2. Let the worker finish its in-flight deployment
        if let Some(handle) = self.deployment_worker_handle.take() {
            handle
                .await
                .map_err(|e| DispatchError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
