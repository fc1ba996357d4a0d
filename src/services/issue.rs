//! Duplicate issue detection.
//!
//! DESIGN
//! ======
//! A new issue is embedded as `"{title} {body}"` and compared with the
//! nearest issue already stored for the repository. With threshold `T`
//! and cosine distance `d`:
//!
//! - `d < 1 - T`: duplicate, comment and close
//! - `d < 1 - T/2`: possibly related, comment
//! - otherwise: most likely new, comment with the nearest issue
//!
//! An empty collection produces no comment. The issue is stored
//! afterwards either way, and excluded from its own search so a
//! redelivered event never matches itself.

use tracing::info;

use super::{ServiceError, embed_one};
use crate::state::AppState;
use crate::vector::{IssueMatch, IssueRecord};
use crate::webhook::{IssuePayload, Repository};

/// Text an issue is embedded from.
#[must_use]
pub fn full_issue(title: &str, body: &str) -> String {
    format!("{title} {body}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Duplicate,
    PossiblyRelated,
    LikelyNew,
}

impl Verdict {
    /// Classify a cosine distance against the similarity threshold.
    #[must_use]
    pub fn classify(distance: f64, threshold: f64) -> Self {
        if distance < 1.0 - threshold {
            Self::Duplicate
        } else if distance < 1.0 - threshold * 0.5 {
            Self::PossiblyRelated
        } else {
            Self::LikelyNew
        }
    }

    /// Comment posted on the new issue.
    #[must_use]
    pub fn comment(self, nearest: &IssueMatch) -> String {
        let (number, title) = (nearest.issue_number, &nearest.title);
        match self {
            Self::Duplicate => format!("Closed due to high similarity with issue #{number} with title '{title}'"),
            Self::PossiblyRelated => format!("Possibly related to issue #{number} with title '{title}'"),
            Self::LikelyNew => format!("Most likely a new issue, most similar issue: #{number} with title '{title}'"),
        }
    }
}

/// Compare an opened issue with the repository's issues, comment (and
/// close duplicates), then store it. Returns the verdict, or `None` when
/// there was nothing to compare with.
///
/// # Errors
///
/// Returns an error if embedding, the store, or a GitHub call fails.
pub async fn handle_new_issue(
    state: &AppState,
    installation_id: i64,
    repo: &Repository,
    issue: &IssuePayload,
) -> Result<Option<Verdict>, ServiceError> {
    info!(repo = %repo.full_name, issue = issue.number, "new issue opened");
    let document = full_issue(&issue.title, &issue.body);
    let embedding = embed_one(state.embedder.as_ref(), document.clone()).await?;

    let nearest = state.store.nearest_issue(repo.id, &embedding, Some(issue.number)).await?;
    let verdict = match nearest {
        Some(nearest) => {
            let verdict = Verdict::classify(nearest.distance, state.settings.similarity_threshold);
            state
                .github
                .leave_comment(installation_id, &repo.full_name, issue.number, &verdict.comment(&nearest))
                .await?;
            if verdict == Verdict::Duplicate {
                state.github.close_issue(installation_id, &repo.full_name, issue.number).await?;
            }
            info!(
                repo = %repo.full_name,
                issue = issue.number,
                nearest = nearest.issue_number,
                nearest_title = %nearest.title,
                similarity = %format!("{:.2}", nearest.similarity()),
                ?verdict,
                "compared issue with nearest neighbour"
            );
            Some(verdict)
        }
        None => {
            info!(repo = %repo.full_name, issue = issue.number, "no stored issues to compare with");
            None
        }
    };

    let record = IssueRecord { number: issue.number, title: issue.title.clone(), document, embedding };
    state.store.upsert_issues(repo.id, &[record]).await?;
    Ok(verdict)
}

/// Re-embed an edited issue so later comparisons see its new text.
///
/// # Errors
///
/// Returns an error if embedding or the store fails.
pub async fn reindex_issue(state: &AppState, repo: &Repository, issue: &IssuePayload) -> Result<(), ServiceError> {
    let document = full_issue(&issue.title, &issue.body);
    let embedding = embed_one(state.embedder.as_ref(), document.clone()).await?;
    let record = IssueRecord { number: issue.number, title: issue.title.clone(), document, embedding };
    state.store.upsert_issues(repo.id, &[record]).await?;
    info!(repo = %repo.full_name, issue = issue.number, "re-indexed edited issue");
    Ok(())
}

/// Drop a deleted issue from the store.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn forget_issue(state: &AppState, repo: &Repository, issue_number: i64) -> Result<(), ServiceError> {
    state.store.remove_issue(repo.id, issue_number).await?;
    info!(repo = %repo.full_name, issue = issue_number, "removed deleted issue");
    Ok(())
}

#[cfg(test)]
#[path = "issue_test.rs"]
mod tests;
