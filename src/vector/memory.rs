//! In-memory vector store.
//!
//! Collections live in `BTreeMap`s behind a `tokio::sync::RwLock`, so
//! iteration order (and therefore tie-breaking in similarity queries) is
//! deterministic. Nothing survives a restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::similarity::rank;
use super::{CodeDocument, CodeRecord, IssueMatch, IssueRecord, StoreError, VectorStore};

#[derive(Default)]
struct Collections {
    /// `(repo_id, issue_number)` -> record.
    issues: BTreeMap<(i64, i64), IssueRecord>,
    /// `(repo_id, branch, file_path)` -> record.
    code: BTreeMap<(i64, String, String), CodeRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryVectorStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of issues stored for the repository.
    pub async fn issue_count(&self, repo_id: i64) -> usize {
        let collections = self.inner.read().await;
        collections.issues.keys().filter(|(repo, _)| *repo == repo_id).count()
    }

    /// Stored record for one issue.
    pub async fn issue(&self, repo_id: i64, issue_number: i64) -> Option<IssueRecord> {
        self.inner.read().await.issues.get(&(repo_id, issue_number)).cloned()
    }

    /// Number of code files stored for the repository branch.
    pub async fn code_count(&self, repo_id: i64, branch: &str) -> usize {
        let collections = self.inner.read().await;
        collections
            .code
            .keys()
            .filter(|(repo, b, _)| *repo == repo_id && b == branch)
            .count()
    }
}

#[async_trait::async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_issues(&self, repo_id: i64, issues: &[IssueRecord]) -> Result<(), StoreError> {
        let mut collections = self.inner.write().await;
        for issue in issues {
            collections.issues.insert((repo_id, issue.number), issue.clone());
        }
        Ok(())
    }

    async fn nearest_issue(
        &self,
        repo_id: i64,
        embedding: &[f32],
        exclude: Option<i64>,
    ) -> Result<Option<IssueMatch>, StoreError> {
        let collections = self.inner.read().await;
        let candidates = collections
            .issues
            .range((repo_id, i64::MIN)..=(repo_id, i64::MAX))
            .filter(|((_, number), _)| Some(*number) != exclude)
            .map(|(_, record)| (record.embedding.as_slice(), record));

        Ok(rank(embedding, candidates, 1)
            .into_iter()
            .next()
            .map(|(distance, record)| IssueMatch { issue_number: record.number, title: record.title.clone(), distance }))
    }

    async fn remove_issue(&self, repo_id: i64, issue_number: i64) -> Result<(), StoreError> {
        self.inner.write().await.issues.remove(&(repo_id, issue_number));
        Ok(())
    }

    async fn remove_repo_issues(&self, repo_id: i64) -> Result<u64, StoreError> {
        let mut collections = self.inner.write().await;
        let before = collections.issues.len();
        collections.issues.retain(|(repo, _), _| *repo != repo_id);
        Ok((before - collections.issues.len()) as u64)
    }

    async fn upsert_code(&self, repo_id: i64, branch: &str, files: &[CodeRecord]) -> Result<(), StoreError> {
        let mut collections = self.inner.write().await;
        for file in files {
            collections
                .code
                .insert((repo_id, branch.to_string(), file.file_path.clone()), file.clone());
        }
        Ok(())
    }

    async fn code_by_paths(&self, repo_id: i64, branch: &str, paths: &[String]) -> Result<Vec<CodeDocument>, StoreError> {
        let collections = self.inner.read().await;
        Ok(collections
            .code
            .iter()
            .filter(|((repo, b, path), _)| *repo == repo_id && b == branch && paths.contains(path))
            .map(|(_, record)| CodeDocument {
                file_path: record.file_path.clone(),
                content: record.content.clone(),
                distance: None,
            })
            .collect())
    }

    async fn nearest_code(
        &self,
        repo_id: i64,
        branch: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CodeDocument>, StoreError> {
        let collections = self.inner.read().await;
        let candidates = collections
            .code
            .iter()
            .filter(|((repo, b, _), _)| *repo == repo_id && b == branch)
            .map(|(_, record)| (record.embedding.as_slice(), record));

        Ok(rank(embedding, candidates, limit)
            .into_iter()
            .map(|(distance, record)| CodeDocument {
                file_path: record.file_path.clone(),
                content: record.content.clone(),
                distance: Some(distance),
            })
            .collect())
    }

    async fn prune_code(&self, repo_id: i64, branch: &str, keep: &[String]) -> Result<u64, StoreError> {
        let mut collections = self.inner.write().await;
        let before = collections.code.len();
        collections
            .code
            .retain(|(repo, b, path), _| *repo != repo_id || b != branch || keep.contains(path));
        Ok((before - collections.code.len()) as u64)
    }

    async fn remove_repo_code(&self, repo_id: i64) -> Result<u64, StoreError> {
        let mut collections = self.inner.write().await;
        let before = collections.code.len();
        collections.code.retain(|(repo, _, _), _| *repo != repo_id);
        Ok((before - collections.code.len()) as u64)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
