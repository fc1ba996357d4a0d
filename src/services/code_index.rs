//! Code base indexing for pull request review.
//!
//! DESIGN
//! ======
//! The default branch is shallow-cloned into a temporary directory with
//! the installation token ([`GitCheckout`]). Source files are collected
//! from the checkout, embedded, and upserted into the code collection of
//! `(repo_id, branch)`. The checkout is a [`TempDir`], so it is removed
//! when dropped on every path, including errors.
//!
//! Cloning sits behind the [`SourceCheckout`] trait so tests can serve a
//! fixture tree instead of running git.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use super::{ServiceError, embed_all};
use crate::deps::{DependencyGraph, DepsError};
use crate::state::AppState;
use crate::vector::CodeRecord;

/// Extensions treated as source code.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "rs", "go", "js", "jsx", "ts", "tsx", "java", "kt", "rb", "php", "c", "h", "cc", "cpp", "hpp", "cs", "swift",
    "scala", "sh",
];

/// Files above this size are skipped (generated code, fixtures, bundles).
pub const MAX_FILE_BYTES: u64 = 100 * 1024;

const SKIP_DIRS: &[&str] =
    &[".git", "node_modules", "target", "vendor", "__pycache__", ".venv", "venv", "dist", "build"];

const DEFAULT_GIT_HOST: &str = "https://github.com";

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to create checkout directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("git clone of {repo}@{branch} failed: {stderr}")]
    Clone { repo: String, branch: String, stderr: String },
    #[error("failed to walk checkout: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Deps(#[from] DepsError),
    #[error("checkout scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// =============================================================================
// CHECKOUT
// =============================================================================

#[async_trait::async_trait]
pub trait SourceCheckout: Send + Sync {
    /// Check out `branch` of `repo` (`owner/name`) into a fresh temporary
    /// directory.
    async fn checkout(&self, token: &str, repo: &str, branch: &str) -> Result<TempDir, IndexError>;
}

/// Shallow, single-branch `git clone` over HTTPS.
pub struct GitCheckout {
    host: String,
}

impl GitCheckout {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into().trim_end_matches('/').to_string() }
    }

    fn clone_url(&self, token: &str, repo: &str) -> String {
        let (scheme, host) = self.host.split_once("://").unwrap_or(("https", self.host.as_str()));
        format!("{scheme}://x-access-token:{token}@{host}/{repo}.git")
    }
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_HOST)
    }
}

#[async_trait::async_trait]
impl SourceCheckout for GitCheckout {
    async fn checkout(&self, token: &str, repo: &str, branch: &str) -> Result<TempDir, IndexError> {
        let dir = tempfile::tempdir().map_err(IndexError::TempDir)?;
        let output = Command::new("git")
            .args(["clone", "--quiet", "--depth", "1", "--single-branch", "-b", branch])
            .arg(self.clone_url(token, repo))
            .arg(dir.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(IndexError::Spawn)?;

        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if !token.is_empty() {
                stderr = stderr.replace(token, "***");
            }
            return Err(IndexError::Clone { repo: repo.to_string(), branch: branch.to_string(), stderr });
        }
        debug!(repo, branch, path = %dir.path().display(), "cloned repository");
        Ok(dir)
    }
}

// =============================================================================
// SOURCE FILES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the checkout root, `/`-separated.
    pub path: String,
    pub content: String,
}

/// Collect source files under `root`, sorted by path. Skips VCS, vendor,
/// and build directories, unknown extensions, oversized files, and files
/// that are not UTF-8.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked or a file cannot be read.
pub fn collect_source_files(root: &Path) -> Result<Vec<SourceFile>, IndexError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| !is_skipped_dir(entry));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
            continue;
        }
        if entry.metadata()?.len() > MAX_FILE_BYTES {
            debug!(path = %entry.path().display(), "skipping oversized file");
            continue;
        }
        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => continue,
            Err(source) => return Err(IndexError::Read { path: entry.path().to_path_buf(), source }),
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect::<Vec<_>>()
            .join("/");
        files.push(SourceFile { path, content });
    }
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Collect the source files and import graph of a checkout on the
/// blocking pool. The checkout directory is removed when the scan ends.
///
/// # Errors
///
/// Returns an error if the scan fails or its task panics.
pub async fn scan_checkout(checkout: TempDir) -> Result<(Vec<SourceFile>, DependencyGraph), IndexError> {
    tokio::task::spawn_blocking(move || -> Result<_, IndexError> {
        let files = collect_source_files(checkout.path())?;
        let graph = DependencyGraph::build(checkout.path(), "", &BTreeSet::new())?;
        Ok((files, graph))
    })
    .await?
}

/// Text a source file is embedded from.
#[must_use]
pub fn code_document(file: &SourceFile) -> String {
    format!("File: {}\n{}", file.path, file.content)
}

/// Embed and store source files for one repository branch, dropping
/// stored files of the branch that are no longer present. Returns the
/// number of files stored.
///
/// # Errors
///
/// Returns an error if embedding or the store fails.
pub async fn index_files(
    state: &AppState,
    repo_id: i64,
    branch: &str,
    files: &[SourceFile],
) -> Result<usize, ServiceError> {
    let documents: Vec<String> = files.iter().map(code_document).collect();
    let embeddings = embed_all(state.embedder.as_ref(), &documents).await?;
    let records: Vec<CodeRecord> = files
        .iter()
        .zip(embeddings)
        .map(|(file, embedding)| CodeRecord { file_path: file.path.clone(), content: file.content.clone(), embedding })
        .collect();
    let present: Vec<String> = files.iter().map(|file| file.path.clone()).collect();
    let pruned = state.store.prune_code(repo_id, branch, &present).await?;
    if !records.is_empty() {
        state.store.upsert_code(repo_id, branch, &records).await?;
    }
    info!(repo_id, branch, files = records.len(), pruned, "indexed code base");
    Ok(records.len())
}

#[cfg(test)]
#[path = "code_index_test.rs"]
mod tests;
