//! Typed GitHub webhook events.
//!
//! DESIGN
//! ======
//! Payloads are deserialized into loose wire structs (every field optional)
//! and then validated into [`WebhookEvent`], so a missing installation or
//! repository surfaces as a specific [`EventError`] instead of a generic
//! serde failure. Event types the service does not act on parse to
//! [`WebhookEvent::Ignored`].

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Installation ID is missing")]
    MissingInstallation,
    #[error("Repository full name or ID is missing")]
    MissingIssueRepository,
    #[error("Repository information missing")]
    MissingPullRequestRepository,
    #[error("payload field missing: {0}")]
    MissingField(&'static str),
}

// =============================================================================
// VALIDATED EVENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: i64,
    pub full_name: String,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePayload {
    pub number: i64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestPayload {
    pub number: i64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Ping,
    Installation { action: String, installation_id: i64, repositories: Vec<Repository> },
    InstallationRepositories { action: String, installation_id: i64, added: Vec<Repository>, removed: Vec<Repository> },
    Issues { action: String, installation_id: i64, repository: Repository, issue: IssuePayload },
    PullRequest { action: String, installation_id: i64, repository: Repository, pull_request: PullRequestPayload },
    Ignored { event_type: String, installation_id: i64 },
}

impl WebhookEvent {
    /// Parse a delivery body for the given `X-GitHub-Event` type.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, a missing installation ID on
    /// non-ping events, or a missing repository on issue and pull request
    /// events.
    pub fn parse(event_type: &str, body: &[u8]) -> Result<Self, EventError> {
        let wire: WireEvent = serde_json::from_slice(body)?;
        if event_type == "ping" {
            return Ok(Self::Ping);
        }

        let installation_id = wire
            .installation
            .and_then(|i| i.id)
            .ok_or(EventError::MissingInstallation)?;
        let action = wire.action.unwrap_or_default();

        match event_type {
            "installation" => Ok(Self::Installation {
                action,
                installation_id,
                repositories: valid_repositories(wire.repositories),
            }),
            "installation_repositories" => Ok(Self::InstallationRepositories {
                action,
                installation_id,
                added: valid_repositories(wire.repositories_added),
                removed: valid_repositories(wire.repositories_removed),
            }),
            "issues" => {
                let issue = wire.issue.ok_or(EventError::MissingField("issue"))?;
                let repository = wire
                    .repository
                    .and_then(WireRepository::validate)
                    .ok_or(EventError::MissingIssueRepository)?;
                Ok(Self::Issues {
                    action,
                    installation_id,
                    repository,
                    issue: IssuePayload {
                        number: issue.number.ok_or(EventError::MissingField("issue.number"))?,
                        title: issue.title.ok_or(EventError::MissingField("issue.title"))?,
                        body: issue.body.unwrap_or_default(),
                    },
                })
            }
            "pull_request" => {
                let pr = wire.pull_request.ok_or(EventError::MissingField("pull_request"))?;
                let repository = wire
                    .repository
                    .and_then(WireRepository::validate)
                    .ok_or(EventError::MissingPullRequestRepository)?;
                Ok(Self::PullRequest {
                    action,
                    installation_id,
                    repository,
                    pull_request: PullRequestPayload {
                        number: pr.number.ok_or(EventError::MissingField("pull_request.number"))?,
                        title: pr.title.unwrap_or_default(),
                        body: pr.body.unwrap_or_default(),
                    },
                })
            }
            other => Ok(Self::Ignored { event_type: other.to_string(), installation_id }),
        }
    }
}

fn valid_repositories(raw: Option<Vec<WireRepository>>) -> Vec<Repository> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(WireRepository::validate)
        .collect()
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct WireEvent {
    action: Option<String>,
    installation: Option<WireInstallation>,
    repository: Option<WireRepository>,
    repositories: Option<Vec<WireRepository>>,
    repositories_added: Option<Vec<WireRepository>>,
    repositories_removed: Option<Vec<WireRepository>>,
    issue: Option<WireIssue>,
    pull_request: Option<WireIssue>,
}

#[derive(Deserialize)]
struct WireInstallation {
    id: Option<i64>,
}

#[derive(Deserialize)]
struct WireRepository {
    id: Option<i64>,
    full_name: Option<String>,
    default_branch: Option<String>,
}

impl WireRepository {
    fn validate(self) -> Option<Repository> {
        let full_name = self.full_name.filter(|name| !name.is_empty())?;
        Some(Repository { id: self.id?, full_name, default_branch: self.default_branch })
    }
}

#[derive(Deserialize)]
struct WireIssue {
    number: Option<i64>,
    title: Option<String>,
    body: Option<String>,
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
