//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! handed to services on background tasks. Every collaborator sits behind
//! an `Arc<dyn Trait>` (GitHub, embedder, chat model, vector store,
//! checkout) so tests swap in the mocks from [`test_helpers`].

use std::sync::Arc;

use crate::config::{AppConfig, DEFAULT_CODE_CONTEXT_LIMIT, DEFAULT_FEEDBACK_MAX_TOKENS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::github::GitHubApi;
use crate::llm::{Embedder, LlmChat};
use crate::services::code_index::{GitCheckout, SourceCheckout};
use crate::vector::VectorStore;

/// Tunables read by the services.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceSettings {
    pub similarity_threshold: f64,
    /// Nearest files used as review context when no dependency matched.
    pub code_context_limit: usize,
    pub feedback_max_tokens: u32,
}

impl ServiceSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            code_context_limit: config.code_context_limit,
            feedback_max_tokens: config.feedback_max_tokens,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            code_context_limit: DEFAULT_CODE_CONTEXT_LIMIT,
            feedback_max_tokens: DEFAULT_FEEDBACK_MAX_TOKENS,
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub webhook_secret: Arc<str>,
    pub settings: ServiceSettings,
    pub github: Arc<dyn GitHubApi>,
    pub embedder: Arc<dyn Embedder>,
    /// Chat model for pull request feedback. `None` if not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub store: Arc<dyn VectorStore>,
    pub checkout: Arc<dyn SourceCheckout>,
}

impl AppState {
    #[must_use]
    pub fn new(
        webhook_secret: &str,
        settings: ServiceSettings,
        github: Arc<dyn GitHubApi>,
        embedder: Arc<dyn Embedder>,
        llm: Option<Arc<dyn LlmChat>>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            webhook_secret: Arc::from(webhook_secret),
            settings,
            github,
            embedder,
            llm,
            store,
            checkout: Arc::new(GitCheckout::default()),
        }
    }

    #[must_use]
    pub fn with_checkout(mut self, checkout: Arc<dyn SourceCheckout>) -> Self {
        self.checkout = checkout;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
