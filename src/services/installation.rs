//! Repository bootstrap and removal for App installations.
//!
//! When the App gains access to a repository, every existing issue
//! (pull requests excluded) is embedded and stored so the first new issue
//! already has neighbours. When access is revoked, the repository's
//! issues and code are dropped.

use tracing::{error, info};

use super::issue::full_issue;
use super::{ServiceError, embed_all};
use crate::state::AppState;
use crate::vector::{IssueRecord, last_per_key};
use crate::webhook::Repository;

/// Bootstrap each repository, continuing past failures. Returns the
/// first error after every repository has been attempted.
///
/// # Errors
///
/// Returns the first repository failure.
pub async fn bootstrap_repositories(
    state: &AppState,
    installation_id: i64,
    repos: &[Repository],
) -> Result<(), ServiceError> {
    let mut first_error = None;
    for repo in repos {
        info!(repo = %repo.full_name, installation_id, "repository added to installation");
        if let Err(e) = bootstrap_repository(state, installation_id, repo).await {
            error!(repo = %repo.full_name, error = %e, "repository bootstrap failed");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Load every existing issue of one repository into the store. Returns
/// the number of issues loaded.
///
/// # Errors
///
/// Returns an error if listing, embedding, or storing fails.
pub async fn bootstrap_repository(
    state: &AppState,
    installation_id: i64,
    repo: &Repository,
) -> Result<usize, ServiceError> {
    let listed: Vec<_> = state
        .github
        .list_issues(installation_id, &repo.full_name)
        .await?
        .into_iter()
        .filter(|issue| !issue.is_pull_request())
        .collect();
    // Page-numbered listing repeats an issue when one is opened mid-walk.
    let issues: Vec<_> = last_per_key(&listed, |issue| issue.number).into_iter().cloned().collect();

    let documents: Vec<String> = issues
        .iter()
        .map(|issue| full_issue(&issue.title, issue.body.as_deref().unwrap_or_default()))
        .collect();
    let embeddings = embed_all(state.embedder.as_ref(), &documents).await?;

    let records: Vec<IssueRecord> = issues
        .into_iter()
        .zip(documents)
        .zip(embeddings)
        .map(|((issue, document), embedding)| IssueRecord { number: issue.number, title: issue.title, document, embedding })
        .collect();
    if !records.is_empty() {
        state.store.upsert_issues(repo.id, &records).await?;
    }

    info!(repo = %repo.full_name, count = records.len(), "loaded existing issues into vector store");
    Ok(records.len())
}

/// Drop stored issues and code of each repository.
///
/// # Errors
///
/// Returns the first store failure.
pub async fn remove_repositories(state: &AppState, repos: &[Repository]) -> Result<(), ServiceError> {
    for repo in repos {
        let issues = state.store.remove_repo_issues(repo.id).await?;
        let files = state.store.remove_repo_code(repo.id).await?;
        info!(repo = %repo.full_name, issues, files, "repository removed from installation");
    }
    Ok(())
}

#[cfg(test)]
#[path = "installation_test.rs"]
mod tests;
