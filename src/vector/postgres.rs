//! Postgres-backed vector store.
//!
//! Embeddings are stored as `REAL[]`. Similarity queries fetch a
//! repository's rows and rank them with [`super::similarity::rank`].

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::similarity::rank;
use super::{CodeDocument, CodeRecord, IssueMatch, IssueRecord, StoreError, VectorStore, last_per_key};

/// Rows per multi-value insert; keeps bind parameters well under the
/// Postgres limit of 65535.
const UPSERT_CHUNK: usize = 500;

#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VectorStore for PgVectorStore {
    async fn upsert_issues(&self, repo_id: i64, issues: &[IssueRecord]) -> Result<(), StoreError> {
        let issues = last_per_key(issues, |issue| issue.number);
        for chunk in issues.chunks(UPSERT_CHUNK) {
            let mut builder: QueryBuilder<'_, Postgres> =
                QueryBuilder::new("INSERT INTO issue_embeddings (repo_id, issue_number, title, document, embedding) ");
            builder.push_values(chunk.iter().copied(), |mut row, issue| {
                row.push_bind(repo_id)
                    .push_bind(issue.number)
                    .push_bind(&issue.title)
                    .push_bind(&issue.document)
                    .push_bind(&issue.embedding);
            });
            builder.push(
                " ON CONFLICT (repo_id, issue_number) DO UPDATE SET
                    title = EXCLUDED.title,
                    document = EXCLUDED.document,
                    embedding = EXCLUDED.embedding,
                    updated_at = now()",
            );
            builder.build().execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn nearest_issue(
        &self,
        repo_id: i64,
        embedding: &[f32],
        exclude: Option<i64>,
    ) -> Result<Option<IssueMatch>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String, Vec<f32>)>(
            "SELECT issue_number, title, embedding
             FROM issue_embeddings
             WHERE repo_id = $1 AND ($2::BIGINT IS NULL OR issue_number <> $2)
             ORDER BY issue_number",
        )
        .bind(repo_id)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows
            .iter()
            .map(|(number, title, vector)| (vector.as_slice(), (*number, title)));
        Ok(rank(embedding, candidates, 1)
            .into_iter()
            .next()
            .map(|(distance, (issue_number, title))| IssueMatch { issue_number, title: title.clone(), distance }))
    }

    async fn remove_issue(&self, repo_id: i64, issue_number: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM issue_embeddings WHERE repo_id = $1 AND issue_number = $2")
            .bind(repo_id)
            .bind(issue_number)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_repo_issues(&self, repo_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM issue_embeddings WHERE repo_id = $1")
            .bind(repo_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn upsert_code(&self, repo_id: i64, branch: &str, files: &[CodeRecord]) -> Result<(), StoreError> {
        let files = last_per_key(files, |file| file.file_path.as_str());
        for chunk in files.chunks(UPSERT_CHUNK) {
            let mut builder: QueryBuilder<'_, Postgres> =
                QueryBuilder::new("INSERT INTO code_embeddings (repo_id, branch, file_path, content, embedding) ");
            builder.push_values(chunk.iter().copied(), |mut row, file| {
                row.push_bind(repo_id)
                    .push_bind(branch)
                    .push_bind(&file.file_path)
                    .push_bind(&file.content)
                    .push_bind(&file.embedding);
            });
            builder.push(
                " ON CONFLICT (repo_id, branch, file_path) DO UPDATE SET
                    content = EXCLUDED.content,
                    embedding = EXCLUDED.embedding,
                    updated_at = now()",
            );
            builder.build().execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn code_by_paths(&self, repo_id: i64, branch: &str, paths: &[String]) -> Result<Vec<CodeDocument>, StoreError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT file_path, content
             FROM code_embeddings
             WHERE repo_id = $1 AND branch = $2 AND file_path = ANY($3)
             ORDER BY file_path",
        )
        .bind(repo_id)
        .bind(branch)
        .bind(paths)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(file_path, content)| CodeDocument { file_path, content, distance: None })
            .collect())
    }

    async fn nearest_code(
        &self,
        repo_id: i64,
        branch: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CodeDocument>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, Vec<f32>)>(
            "SELECT file_path, content, embedding
             FROM code_embeddings
             WHERE repo_id = $1 AND branch = $2
             ORDER BY file_path",
        )
        .bind(repo_id)
        .bind(branch)
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows
            .iter()
            .map(|(path, content, vector)| (vector.as_slice(), (path, content)));
        Ok(rank(embedding, candidates, limit)
            .into_iter()
            .map(|(distance, (path, content))| CodeDocument {
                file_path: path.clone(),
                content: content.clone(),
                distance: Some(distance),
            })
            .collect())
    }

    async fn prune_code(&self, repo_id: i64, branch: &str, keep: &[String]) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM code_embeddings
             WHERE repo_id = $1 AND branch = $2 AND NOT (file_path = ANY($3))",
        )
        .bind(repo_id)
        .bind(branch)
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn remove_repo_code(&self, repo_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM code_embeddings WHERE repo_id = $1")
            .bind(repo_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
