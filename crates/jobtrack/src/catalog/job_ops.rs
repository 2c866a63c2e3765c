//! Job operation lookup table.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, instrument};

/// A job operation: a numbered step operators book time against.
///
/// `active` only controls whether the operation is offered for *new*
/// records; inactive operations remain valid for historical ones.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobOp {
    pub id: i64,
    pub op_name: String,
    pub active: bool,
}

/// Repository for job operation database operations.
#[derive(Debug, Clone)]
pub struct JobOpRepository {
    pool: SqlitePool,
}

impl JobOpRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all operations, lowest id first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<JobOp>> {
        sqlx::query_as::<_, JobOp>("SELECT id, op_name, active FROM job_ops ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list job operations")
    }

    /// List only the operations offered for new assignments.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<JobOp>> {
        sqlx::query_as::<_, JobOp>(
            "SELECT id, op_name, active FROM job_ops WHERE active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active job operations")
    }

    /// Get an operation by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<JobOp>> {
        sqlx::query_as::<_, JobOp>("SELECT id, op_name, active FROM job_ops WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch job operation")
    }

    /// Highest operation id currently in use (0 when the table is empty).
    ///
    /// Surfaced when an administrator picks an id for a new operation.
    #[instrument(skip(self))]
    pub async fn highest_id(&self) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT MAX(id) FROM job_ops")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query highest job operation id")?;

        Ok(row.map(|(id,)| id).unwrap_or(0))
    }

    /// Create a new operation; the id must not be in use.
    ///
    /// New operations start active.
    #[instrument(skip(self))]
    pub async fn create(&self, id: i64, op_name: &str) -> Result<JobOp> {
        if self.get(id).await?.is_some() {
            let highest = self.highest_id().await?;
            bail!(
                "Operation id {} is already in use; highest id currently in use is {}.",
                id,
                highest
            );
        }

        sqlx::query("INSERT INTO job_ops (id, op_name, active) VALUES (?, ?, TRUE)")
            .bind(id)
            .bind(op_name)
            .execute(&self.pool)
            .await
            .context("Failed to insert job operation")?;

        info!(id, "Created job operation");
        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Job operation not found after creation"))
    }

    /// Update an operation's name and active flag.
    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, op_name: &str, active: bool) -> Result<JobOp> {
        let result = sqlx::query("UPDATE job_ops SET op_name = ?, active = ? WHERE id = ?")
            .bind(op_name)
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update job operation")?;

        if result.rows_affected() == 0 {
            bail!("Job operation not found: {}", id);
        }

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Job operation not found after update"))
    }

    /// Delete an operation.
    ///
    /// Callers must check deletability through the integrity guard
    /// first; this method performs the raw store mutation only.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM job_ops WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete job operation")?;

        if result.rows_affected() == 0 {
            bail!("Job operation not found: {}", id);
        }

        info!(id, "Deleted job operation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn repo() -> JobOpRepository {
        let db = Database::in_memory().await.unwrap();
        JobOpRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let repo = repo().await;
        repo.create(1, "Turning").await.unwrap();
        repo.create(2, "Milling").await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|op| op.active));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_with_highest_hint() {
        let repo = repo().await;
        repo.create(7, "Milling").await.unwrap();

        let err = repo.create(7, "Grinding").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("already in use"));
        assert!(msg.contains('7'));
    }

    #[tokio::test]
    async fn test_highest_id() {
        let repo = repo().await;
        assert_eq!(repo.highest_id().await.unwrap(), 0);

        repo.create(3, "Deburr").await.unwrap();
        repo.create(12, "Inspect").await.unwrap();
        assert_eq!(repo.highest_id().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_update_and_active_filter() {
        let repo = repo().await;
        repo.create(1, "Turning").await.unwrap();
        repo.create(2, "Milling").await.unwrap();

        repo.update(2, "Milling", false).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 1);

        // Inactive operations are still present in the full list.
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        repo.create(5, "Anodize").await.unwrap();
        repo.delete(5).await.unwrap();

        assert!(repo.get(5).await.unwrap().is_none());
        assert!(repo.delete(5).await.is_err());
    }
}
