//! Deployment worker tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use release_dispatcher::app::options::{AppOptions, ServerOptions};
use release_dispatcher::app::run::run;
use release_dispatcher::deploy::Deployer;
use release_dispatcher::errors::DispatchError;
use release_dispatcher::models::deployment::DeploymentState;
use release_dispatcher::queue;
use release_dispatcher::status::StatusStore;
use release_dispatcher::webhook::signature::SignatureVerifier;
use release_dispatcher::workers::deployer as worker;

/// Records every call and fails versions listed in `failing`
struct RecordingDeployer {
    status: Arc<StatusStore>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    failing: Vec<String>,
    delay: Duration,
}

impl RecordingDeployer {
    fn new(status: Arc<StatusStore>) -> Self {
        Self {
            status,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            failing: Vec::new(),
            delay: Duration::from_millis(5),
        }
    }

    fn failing(mut self, versions: &[&str]) -> Self {
        self.failing = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deployer for RecordingDeployer {
    async fn deploy(&self, version: &str) -> Result<(), DispatchError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        // The worker publishes `deploying` before invoking the deployer
        let current = self.status.current().await.unwrap();
        assert_eq!(current.version, version);
        assert_eq!(current.status, DeploymentState::Deploying);

        self.calls.lock().unwrap().push(version.to_string());
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|v| v == version) {
            return Err(DispatchError::DeployError(format!(
                "Deploy script exit status: 1 ({version})"
            )));
        }
        Ok(())
    }

    fn environment(&self) -> &str {
        "test"
    }
}

/// Holds the first deployment until `release` fires
struct GatedDeployer {
    gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl GatedDeployer {
    fn new(release: oneshot::Receiver<()>) -> Self {
        Self {
            gate: tokio::sync::Mutex::new(Some(release)),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Deployer for GatedDeployer {
    async fn deploy(&self, version: &str) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(version.to_string());
        let gate = self.gate.lock().await.take();
        if let Some(release) = gate {
            let _ = release.await;
        }
        Ok(())
    }

    fn environment(&self) -> &str {
        "test"
    }
}

fn never() -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    Box::pin(std::future::pending())
}

#[tokio::test]
async fn test_worker_deploys_in_fifo_order_one_at_a_time() {
    let status = Arc::new(StatusStore::new());
    let deployer = Arc::new(RecordingDeployer::new(status.clone()));
    let (queue, receiver) = queue::channel(10);

    for version in ["v1", "v2", "v3"] {
        queue.enqueue(version).unwrap();
    }
    // Dropping the only producer lets the worker exit after draining
    drop(queue);

    worker::run(receiver, deployer.as_ref(), status.as_ref(), never()).await;

    assert_eq!(deployer.calls(), vec!["v1", "v2", "v3"]);
    assert_eq!(deployer.max_in_flight.load(Ordering::SeqCst), 1);

    let last = status.current().await.unwrap();
    assert_eq!(last.version, "v3");
    assert_eq!(last.status, DeploymentState::Success);
}

#[tokio::test]
async fn test_worker_records_failure_and_continues() {
    let status = Arc::new(StatusStore::new());
    let deployer = Arc::new(RecordingDeployer::new(status.clone()).failing(&["v2"]));
    let (queue, receiver) = queue::channel(10);

    let handle = {
        let deployer = deployer.clone();
        let status = status.clone();
        tokio::spawn(async move {
            worker::run(receiver, deployer.as_ref(), status.as_ref(), never()).await;
        })
    };

    queue.enqueue("v2").unwrap();
    let failed = wait_for_terminal(&status, "v2").await;
    assert_eq!(failed.status, DeploymentState::Failed);
    assert!(failed.error.as_deref().unwrap().contains("exit status"));
    assert!(failed.end_time.unwrap() >= failed.start_time);

    // No retry: the next version is picked up and the failure is superseded
    queue.enqueue("v3").unwrap();
    let next = wait_for_terminal(&status, "v3").await;
    assert_eq!(next.status, DeploymentState::Success);
    assert!(next.error.is_none());

    drop(queue);
    handle.await.unwrap();
    assert_eq!(deployer.calls(), vec!["v2", "v3"]);
}

#[tokio::test]
async fn test_shutdown_discards_pending_versions() {
    let status = Arc::new(StatusStore::new());
    let deployer = RecordingDeployer::new(status.clone());
    let (queue, receiver) = queue::channel(10);
    queue.enqueue("v1").unwrap();
    queue.enqueue("v2").unwrap();

    let (tx, rx) = oneshot::channel::<()>();
    tx.send(()).unwrap();

    worker::run(
        receiver,
        &deployer,
        status.as_ref(),
        Box::pin(async move {
            let _ = rx.await;
        }),
    )
    .await;

    // Shutdown takes priority over pending work and closes the queue
    assert!(deployer.calls().is_empty());
    assert!(status.current().await.is_none());
    assert!(queue.enqueue("v3").is_err());
}

#[tokio::test]
async fn test_shutdown_finishes_in_flight_deployment() {
    let status = Arc::new(StatusStore::new());
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let deployer = Arc::new(GatedDeployer::new(release_rx));
    let (queue, receiver) = queue::channel(10);
    queue.enqueue("v1").unwrap();
    queue.enqueue("v2").unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = {
        let deployer = deployer.clone();
        let status = status.clone();
        tokio::spawn(async move {
            worker::run(
                receiver,
                deployer.as_ref(),
                status.as_ref(),
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        })
    };

    wait_for_state(&status, "v1", DeploymentState::Deploying).await;
    shutdown_tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    release_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap();

    let current = status.current().await.unwrap();
    assert_eq!(current.version, "v1");
    assert_eq!(current.status, DeploymentState::Success);
    assert_eq!(*deployer.calls.lock().unwrap(), vec!["v1"]);
    assert!(queue.enqueue("v3").is_err());
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let options = AppOptions {
        server: ServerOptions {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        ..Default::default()
    };
    let (_release_tx, release_rx) = oneshot::channel::<()>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(run(
        options,
        SignatureVerifier::new(""),
        Arc::new(GatedDeployer::new(release_rx)),
        async move {
            let _ = shutdown_rx.await;
        },
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("dispatcher did not shut down")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_deploy_version_success_status() {
    let status = Arc::new(StatusStore::new());
    let deployer = RecordingDeployer::new(status.clone());

    worker::deploy_version("v9.9.9", &deployer, &status).await;

    let current = status.current().await.unwrap();
    assert_eq!(current.status, DeploymentState::Success);
    assert!(current.end_time.unwrap() >= current.start_time);
}

async fn wait_for_state(status: &StatusStore, version: &str, state: DeploymentState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(current) = status.current().await {
                if current.version == version && current.status == state {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("deployment did not reach the expected state")
}

async fn wait_for_terminal(
    status: &StatusStore,
    version: &str,
) -> release_dispatcher::models::deployment::DeploymentStatus {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(current) = status.current().await {
                if current.version == version && current.is_terminal() {
                    return current;
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("deployment did not finish in time")
}
