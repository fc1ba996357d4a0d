//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the homepage feature section at `/` (and as
//! JSON at `/api/features`), the GitHub webhook at `/webhook`, and a
//! health probe. Every request is traced through `TraceLayer`.

pub mod home;
pub mod webhook;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::homepage))
        .route("/api/features", get(home::features))
        .route("/webhook", post(webhook::receive))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
