//! GitHub App REST client.
//!
//! ARCHITECTURE
//! ============
//! Services talk to GitHub through the [`GitHubApi`] trait. The concrete
//! [`GitHubAppClient`] authenticates as the App (RS256 JWT, see `jwt`),
//! exchanges that for per-installation tokens, and caches each token for
//! [`TOKEN_TTL`], comfortably inside GitHub's one-hour expiry.

pub mod jwt;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::GitHubAppConfig;
use jwt::AppSigner;

const USER_AGENT: &str = "doppelganger";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";
const PER_PAGE: u32 = 100;
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("invalid app private key: {0}")]
    InvalidKey(String),
    #[error("jwt signing failed: {0}")]
    Jwt(String),
    #[error("github request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("github api error: status {status}: {body}")]
    Status { status: u16, body: String },
}

/// An issue as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    token: String,
}

#[async_trait::async_trait]
pub trait GitHubApi: Send + Sync {
    /// Installation access token, usable for API calls and git over HTTPS.
    async fn installation_token(&self, installation_id: i64) -> Result<String, GitHubError>;

    async fn leave_comment(&self, installation_id: i64, repo: &str, number: i64, body: &str) -> Result<(), GitHubError>;

    async fn close_issue(&self, installation_id: i64, repo: &str, number: i64) -> Result<(), GitHubError>;

    /// Every issue and pull request of the repository, open and closed.
    async fn list_issues(&self, installation_id: i64, repo: &str) -> Result<Vec<Issue>, GitHubError>;

    /// Unified diff of a pull request.
    async fn pull_request_diff(&self, installation_id: i64, repo: &str, number: i64) -> Result<String, GitHubError>;

    /// Paths of the files a pull request touches.
    async fn pull_request_files(&self, installation_id: i64, repo: &str, number: i64) -> Result<Vec<String>, GitHubError>;
}

// =============================================================================
// CLIENT
// =============================================================================

struct CachedToken {
    token: String,
    fetched_at: Instant,
}

/// Installation tokens by installation id. The lock covers single map
/// operations only, so refreshes for different installations overlap.
struct TokenCache {
    ttl: Duration,
    entries: Mutex<HashMap<i64, CachedToken>>,
}

impl TokenCache {
    fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    async fn get(&self, installation_id: i64) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .get(&installation_id)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.token.clone())
    }

    async fn put(&self, installation_id: i64, token: String) {
        self.entries
            .lock()
            .await
            .insert(installation_id, CachedToken { token, fetched_at: Instant::now() });
    }
}

pub struct GitHubAppClient {
    http: reqwest::Client,
    api_url: String,
    signer: AppSigner,
    tokens: TokenCache,
}

impl GitHubAppClient {
    /// # Errors
    ///
    /// Returns an error if the private key is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &GitHubAppConfig) -> Result<Self, GitHubError> {
        let signer = AppSigner::new(config.app_id.clone(), &config.private_key_pem)?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, api_url: config.api_url.clone(), signer, tokens: TokenCache::new(TOKEN_TTL) })
    }

    async fn authed(&self, installation_id: i64, builder: RequestBuilder) -> Result<RequestBuilder, GitHubError> {
        let token = self.installation_token(installation_id).await?;
        Ok(builder.header("Authorization", format!("token {token}")))
    }

    async fn fetch_pages<T: DeserializeOwned>(
        &self,
        installation_id: i64,
        url: &str,
        extra_query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();
        let mut page = 1_u32;
        loop {
            let request = self
                .http
                .get(url)
                .header("Accept", ACCEPT_JSON)
                .query(extra_query)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let response = send(self.authed(installation_id, request).await?).await?;
            let batch: Vec<T> = response.json().await?;
            if batch.is_empty() {
                break;
            }
            items.extend(batch);
            page += 1;
        }
        Ok(items)
    }
}

/// Send a request and turn non-success statuses into [`GitHubError::Status`].
async fn send(request: RequestBuilder) -> Result<reqwest::Response, GitHubError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GitHubError::Status { status: status.as_u16(), body })
}

#[async_trait::async_trait]
impl GitHubApi for GitHubAppClient {
    async fn installation_token(&self, installation_id: i64) -> Result<String, GitHubError> {
        if let Some(token) = self.tokens.get(installation_id).await {
            return Ok(token);
        }

        let jwt = self.signer.sign()?;
        let response = send(
            self.http
                .post(format!("{}/app/installations/{installation_id}/access_tokens", self.api_url))
                .header("Authorization", format!("Bearer {jwt}"))
                .header("Accept", ACCEPT_JSON),
        )
        .await?;
        let AccessToken { token } = response.json().await?;
        debug!(installation_id, "minted installation token");

        self.tokens.put(installation_id, token.clone()).await;
        Ok(token)
    }

    async fn leave_comment(&self, installation_id: i64, repo: &str, number: i64, body: &str) -> Result<(), GitHubError> {
        let request = self
            .http
            .post(format!("{}/repos/{repo}/issues/{number}/comments", self.api_url))
            .header("Accept", ACCEPT_JSON)
            .json(&serde_json::json!({ "body": body }));
        send(self.authed(installation_id, request).await?).await?;
        Ok(())
    }

    async fn close_issue(&self, installation_id: i64, repo: &str, number: i64) -> Result<(), GitHubError> {
        let request = self
            .http
            .patch(format!("{}/repos/{repo}/issues/{number}", self.api_url))
            .header("Accept", ACCEPT_JSON)
            .json(&serde_json::json!({ "state": "closed" }));
        send(self.authed(installation_id, request).await?).await?;
        Ok(())
    }

    async fn list_issues(&self, installation_id: i64, repo: &str) -> Result<Vec<Issue>, GitHubError> {
        let url = format!("{}/repos/{repo}/issues", self.api_url);
        self.fetch_pages(installation_id, &url, &[("state", "all")]).await
    }

    async fn pull_request_diff(&self, installation_id: i64, repo: &str, number: i64) -> Result<String, GitHubError> {
        let request = self
            .http
            .get(format!("{}/repos/{repo}/pulls/{number}", self.api_url))
            .header("Accept", ACCEPT_DIFF);
        let response = send(self.authed(installation_id, request).await?).await?;
        Ok(response.text().await?)
    }

    async fn pull_request_files(&self, installation_id: i64, repo: &str, number: i64) -> Result<Vec<String>, GitHubError> {
        let url = format!("{}/repos/{repo}/pulls/{number}/files", self.api_url);
        let files: Vec<PullRequestFile> = self.fetch_pages(installation_id, &url, &[]).await?;
        Ok(files.into_iter().map(|f| f.filename).collect())
    }
}
