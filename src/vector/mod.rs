//! Issue and code embeddings per repository.
//!
//! DESIGN
//! ======
//! Issues are keyed by `(repo_id, issue_number)`, code files by
//! `(repo_id, branch, file_path)`. Writes are upserts. Similarity queries
//! load a repository's vectors and rank them in process with cosine
//! distance (`similarity`); per-repo collections are small enough that an
//! index would buy nothing.
//!
//! Two backends implement [`VectorStore`]: Postgres for deployments and an
//! in-memory map for single-process runs and tests.

pub mod memory;
pub mod postgres;
pub mod similarity;

use std::collections::BTreeMap;

pub use memory::MemoryVectorStore;
pub use postgres::PgVectorStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An issue ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    pub number: i64,
    pub title: String,
    /// Text the embedding was computed from (`"{title} {body}"`).
    pub document: String,
    pub embedding: Vec<f32>,
}

/// Nearest stored issue to a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueMatch {
    pub issue_number: i64,
    pub title: String,
    /// Cosine distance, `1 - similarity`.
    pub distance: f64,
}

impl IssueMatch {
    #[must_use]
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

/// A source file ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRecord {
    pub file_path: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A stored source file returned as review context.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeDocument {
    pub file_path: String,
    pub content: String,
    /// Cosine distance to the query; `None` for lookups by path.
    pub distance: Option<f64>,
}

#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace issues of one repository.
    async fn upsert_issues(&self, repo_id: i64, issues: &[IssueRecord]) -> Result<(), StoreError>;

    /// Nearest issue in the repository, skipping `exclude` when given.
    async fn nearest_issue(
        &self,
        repo_id: i64,
        embedding: &[f32],
        exclude: Option<i64>,
    ) -> Result<Option<IssueMatch>, StoreError>;

    async fn remove_issue(&self, repo_id: i64, issue_number: i64) -> Result<(), StoreError>;

    /// Drop every issue of the repository, returning how many were removed.
    async fn remove_repo_issues(&self, repo_id: i64) -> Result<u64, StoreError>;

    /// Insert or replace code files of one repository branch.
    async fn upsert_code(&self, repo_id: i64, branch: &str, files: &[CodeRecord]) -> Result<(), StoreError>;

    /// Stored files whose path is in `paths`, ordered by path.
    async fn code_by_paths(&self, repo_id: i64, branch: &str, paths: &[String]) -> Result<Vec<CodeDocument>, StoreError>;

    /// Up to `limit` files nearest to `embedding`, nearest first.
    async fn nearest_code(
        &self,
        repo_id: i64,
        branch: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CodeDocument>, StoreError>;

    /// Drop files of the branch whose path is not in `keep`, returning how
    /// many were removed.
    async fn prune_code(&self, repo_id: i64, branch: &str, keep: &[String]) -> Result<u64, StoreError>;

    /// Drop every code file of the repository across branches.
    async fn remove_repo_code(&self, repo_id: i64) -> Result<u64, StoreError>;
}

/// The last record for each key, kept at the position of that record.
/// A multi-row upsert may not touch the same key twice.
pub fn last_per_key<'a, T, K: Ord>(records: &'a [T], key: impl Fn(&'a T) -> K) -> Vec<&'a T> {
    let mut last = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        last.insert(key(record), index);
    }
    records
        .iter()
        .enumerate()
        .filter(|(index, record)| last.get(&key(*record)) == Some(index))
        .map(|(_, record)| record)
        .collect()
}
