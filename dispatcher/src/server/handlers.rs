//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::models::deployment::DeploymentStatus;
use crate::models::release::ReleaseNotification;
use crate::queue::QueueError;
use crate::server::state::ServerState;
use crate::webhook::filter::{self, FilterDecision};
use crate::webhook::{EVENT_HEADER, SIGNATURE_HEADER};

/// Webhook requests that are refused rather than acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookRejection {
    UnreadableBody(String),
    InvalidSignature,
    InvalidJson(String),
    MissingVersion,
    QueueFull(String),
    QueueClosed(String),
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            WebhookRejection::UnreadableBody(detail) => (
                StatusCode::BAD_REQUEST,
                format!("Failed to read body: {}", detail),
            ),
            WebhookRejection::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "Invalid signature".to_string())
            }
            WebhookRejection::InvalidJson(detail) => {
                (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", detail))
            }
            WebhookRejection::MissingVersion => {
                (StatusCode::BAD_REQUEST, "No version in payload".to_string())
            }
            WebhookRejection::QueueFull(version) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Deployment queue full, skipping {}", version),
            ),
            WebhookRejection::QueueClosed(version) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Deployment queue unavailable, skipping {}", version),
            ),
        };
        (code, format!("{}\n", message)).into_response()
    }
}

impl From<QueueError> for WebhookRejection {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full(version) => WebhookRejection::QueueFull(version),
            QueueError::Closed(version) => WebhookRejection::QueueClosed(version),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Release webhook handler
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, String), WebhookRejection> {
    let body = body.map_err(|e| {
        error!("Failed to read body: {}", e);
        WebhookRejection::UnreadableBody(e.body_text())
    })?;

    let event_type = header_str(&headers, EVENT_HEADER);
    info!("Received webhook: {}", event_type);

    if let Some(ignored) = filter::check_event(event_type) {
        info!("Ignoring event type: {}", event_type);
        return Ok((StatusCode::OK, format!("{}\n", ignored)));
    }

    let signature = header_str(&headers, SIGNATURE_HEADER);
    if !state.verifier.verify(&body, signature) {
        error!("Invalid signature");
        return Err(WebhookRejection::InvalidSignature);
    }

    let payload: ReleaseNotification = serde_json::from_slice(&body).map_err(|e| {
        error!("Invalid JSON: {}", e);
        WebhookRejection::InvalidJson(e.to_string())
    })?;

    let version = match filter::evaluate(event_type, &payload) {
        FilterDecision::Accepted(version) => version,
        ignored => {
            info!("Ignoring release notification: {}", ignored);
            return Ok((StatusCode::OK, format!("{}\n", ignored)));
        }
    };

    if version.is_empty() {
        error!("No version in payload");
        return Err(WebhookRejection::MissingVersion);
    }

    info!(
        "New release detected: {} from {}",
        version, payload.repository.full_name
    );

    state.queue.enqueue(version.as_str()).map_err(|e| {
        warn!("{}", e);
        WebhookRejection::from(e)
    })?;
    info!(
        "Version {} added to deployment queue (depth {})",
        version,
        state.queue.depth()
    );

    Ok((
        StatusCode::OK,
        format!("{}\n", FilterDecision::Accepted(version)),
    ))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub queue_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_deployment: Option<DeploymentStatus>,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        queue_size: state.queue.depth(),
        current_deployment: state.status.current().await,
    })
}

/// Deployment status response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    Deployment(DeploymentStatus),
    Idle { status: String },
}

/// Deployment status handler
pub async fn status_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let response = match state.status.current().await {
        Some(status) => StatusResponse::Deployment(status),
        None => StatusResponse::Idle {
            status: "no deployment".to_string(),
        },
    };
    Json(response)
}
