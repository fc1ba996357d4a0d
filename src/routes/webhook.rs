//! GitHub webhook endpoint.
//!
//! ARCHITECTURE
//! ============
//! The handler works on the raw body so the HMAC covers exactly the bytes
//! GitHub signed. Verification and decoding failures answer 400 with the
//! error text. Accepted deliveries answer `{"status":"success"}` at once
//! and are handled by [`crate::services::dispatch`] on a spawned task, so
//! GitHub's delivery timeout never waits on embedding or the chat model.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info, warn};

use crate::services;
use crate::state::AppState;
use crate::webhook::{EventError, SignatureError, WebhookEvent, signature};

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";

pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature_header = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = signature::verify(state.webhook_secret.as_bytes(), &body, signature_header) {
        warn!(error = %e, "rejected webhook delivery");
        return signature_error_response(&e);
    }

    let event_type = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("ping");
    let event = match WebhookEvent::parse(event_type, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!(event_type, error = %e, "malformed webhook delivery");
            return event_error_response(&e);
        }
    };
    info!(event_type, "received webhook");

    if event != WebhookEvent::Ping {
        tokio::spawn(async move {
            if let Err(e) = services::dispatch(&state, event).await {
                error!(error = %e, "webhook handling failed");
            }
        });
    }

    (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
}

fn signature_error_response(err: &SignatureError) -> Response {
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

fn event_error_response(err: &EventError) -> Response {
    (event_error_to_status(err), err.to_string()).into_response()
}

pub(crate) fn event_error_to_status(err: &EventError) -> StatusCode {
    match err {
        EventError::InvalidJson(_)
        | EventError::MissingInstallation
        | EventError::MissingIssueRepository
        | EventError::MissingPullRequestRepository
        | EventError::MissingField(_) => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
#[path = "webhook_test.rs"]
mod tests;
