//! Webhook-driven services.
//!
//! ARCHITECTURE
//! ============
//! [`dispatch`] routes a validated [`WebhookEvent`] to the service that
//! owns it. Services own the GitHub, embedding, and vector store calls so
//! the webhook route stays focused on verification and decoding.
//! Failures surface as [`ServiceError`]; the route logs them and never
//! changes the HTTP response because of them.

pub mod code_index;
pub mod installation;
pub mod issue;
pub mod pull_request;

use tracing::{debug, info};

use crate::github::GitHubError;
use crate::llm::{Embedder, LlmError};
use crate::state::AppState;
use crate::vector::StoreError;
use crate::webhook::WebhookEvent;
use code_index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("embedder returned {got} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, got: usize },
    #[error("no chat model configured")]
    LlmUnavailable,
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Handle one webhook event to completion.
///
/// # Errors
///
/// Returns the first error raised by the owning service.
pub async fn dispatch(state: &AppState, event: WebhookEvent) -> Result<(), ServiceError> {
    match event {
        WebhookEvent::Ping => Ok(()),
        WebhookEvent::Installation { action, installation_id, repositories } => match action.as_str() {
            "created" => installation::bootstrap_repositories(state, installation_id, &repositories).await,
            "deleted" => installation::remove_repositories(state, &repositories).await,
            other => {
                info!(action = other, installation_id, "ignoring installation action");
                Ok(())
            }
        },
        WebhookEvent::InstallationRepositories { action, installation_id, added, removed } => match action.as_str() {
            "added" => installation::bootstrap_repositories(state, installation_id, &added).await,
            "removed" => installation::remove_repositories(state, &removed).await,
            other => {
                info!(action = other, installation_id, "ignoring installation_repositories action");
                Ok(())
            }
        },
        WebhookEvent::Issues { action, installation_id, repository, issue } => match action.as_str() {
            "opened" => issue::handle_new_issue(state, installation_id, &repository, &issue)
                .await
                .map(|_| ()),
            "edited" => issue::reindex_issue(state, &repository, &issue).await,
            "deleted" => issue::forget_issue(state, &repository, issue.number).await,
            other => {
                debug!(action = other, issue = issue.number, "ignoring issues action");
                Ok(())
            }
        },
        WebhookEvent::PullRequest { action, installation_id, repository, pull_request } => match action.as_str() {
            "opened" | "edited" => {
                pull_request::handle_pull_request(state, installation_id, &repository, &pull_request).await
            }
            other => {
                debug!(action = other, pr = pull_request.number, "ignoring pull_request action");
                Ok(())
            }
        },
        WebhookEvent::Ignored { event_type, installation_id } => {
            debug!(%event_type, installation_id, "ignoring event");
            Ok(())
        }
    }
}

// =============================================================================
// EMBEDDING HELPERS
// =============================================================================

/// Embed every document, checking that one vector came back per input.
pub(crate) async fn embed_all(embedder: &dyn Embedder, documents: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
    if documents.is_empty() {
        return Ok(Vec::new());
    }
    let vectors = embedder.embed(documents).await?;
    if vectors.len() != documents.len() {
        return Err(ServiceError::EmbeddingCount { expected: documents.len(), got: vectors.len() });
    }
    Ok(vectors)
}

pub(crate) async fn embed_one(embedder: &dyn Embedder, document: String) -> Result<Vec<f32>, ServiceError> {
    let mut vectors = embed_all(embedder, std::slice::from_ref(&document)).await?;
    vectors.pop().ok_or(ServiceError::EmbeddingCount { expected: 1, got: 0 })
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
