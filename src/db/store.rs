//! Pipeline record storage

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::error::RelayError;
use crate::pipeline::PipelineRecord;

/// Persistent storage for pipeline records, one row per pipeline keyed
/// by name. `put` is an upsert; the last writer wins.
#[derive(Clone)]
pub struct SqlPipelineStore {
    pool: SqlitePool,
}

// Helper struct to map DB row to PipelineRecord
#[derive(FromRow)]
struct PipelineRow {
    name: String,
    repo_directory: String,
    remote_token: String,
    branch_name: String,
    remote_owner: String,
    remote_repo: String,
    webhook_secret: String,
    created_at: String,
    last_run_at: Option<String>,
}

impl TryFrom<PipelineRow> for PipelineRecord {
    type Error = RelayError;

    // A row with unparseable timestamps is surfaced as a config error
    // rather than silently defaulted.
    fn try_from(row: PipelineRow) -> Result<Self, RelayError> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| malformed(&row.name))?;

        let last_run_at = match row.last_run_at {
            Some(s) => Some(
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| malformed(&row.name))?,
            ),
            None => None,
        };

        Ok(PipelineRecord {
            name: row.name,
            repo_directory: row.repo_directory,
            remote_token: row.remote_token,
            branch_name: row.branch_name,
            remote_owner: row.remote_owner,
            remote_repo: row.remote_repo,
            webhook_secret: row.webhook_secret,
            created_at,
            last_run_at,
        })
    }
}

fn malformed(name: &str) -> RelayError {
    RelayError::Config(format!(
        "Failed to load pipeline configuration for '{}'.",
        name
    ))
}

impl SqlPipelineStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch a pipeline by name
    pub async fn get(&self, name: &str) -> Result<Option<PipelineRecord>, RelayError> {
        let row = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT
                name, repo_directory, remote_token, branch_name,
                remote_owner, remote_repo, webhook_secret,
                created_at, last_run_at
            FROM pipelines
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelayError::Database(format!("Failed to fetch pipeline: {}", e)))?;

        row.map(PipelineRecord::try_from).transpose()
    }

    /// List every pipeline; order is not significant
    pub async fn list(&self) -> Result<Vec<PipelineRecord>, RelayError> {
        let rows = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT
                name, repo_directory, remote_token, branch_name,
                remote_owner, remote_repo, webhook_secret,
                created_at, last_run_at
            FROM pipelines
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelayError::Database(format!("Failed to list pipelines: {}", e)))?;

        rows.into_iter().map(PipelineRecord::try_from).collect()
    }

    /// Create or overwrite a record. Durable once this returns.
    pub async fn put(&self, record: &PipelineRecord) -> Result<(), RelayError> {
        sqlx::query(
            r#"
            INSERT INTO pipelines (
                name, repo_directory, remote_token, branch_name,
                remote_owner, remote_repo, webhook_secret,
                created_at, last_run_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                repo_directory = excluded.repo_directory,
                remote_token = excluded.remote_token,
                branch_name = excluded.branch_name,
                remote_owner = excluded.remote_owner,
                remote_repo = excluded.remote_repo,
                webhook_secret = excluded.webhook_secret,
                created_at = excluded.created_at,
                last_run_at = excluded.last_run_at
            "#,
        )
        .bind(&record.name)
        .bind(&record.repo_directory)
        .bind(&record.remote_token)
        .bind(&record.branch_name)
        .bind(&record.remote_owner)
        .bind(&record.remote_repo)
        .bind(&record.webhook_secret)
        .bind(record.created_at.to_rfc3339())
        .bind(record.last_run_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::Database(format!("Failed to store pipeline: {}", e)))?;

        Ok(())
    }

    /// Delete a record permanently. Returns false when nothing matched.
    pub async fn delete(&self, name: &str) -> Result<bool, RelayError> {
        let result = sqlx::query("DELETE FROM pipelines WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| RelayError::Database(format!("Failed to delete pipeline: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
