//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::DispatchError;
use crate::server::handlers::{health_handler, status_handler, webhook_handler};
use crate::server::state::ServerState;

/// Build the dispatcher's routes
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Release notifications
        .route("/webhook", post(webhook_handler))
        // Read-only views
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), DispatchError>>, DispatchError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Webhook server starting on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DispatchError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| DispatchError::ServerError(e.to_string()))
    });

    Ok(handle)
}
