//! Job record repository for database operations.

use anyhow::{Context, Result, bail};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use super::models::{JobRecord, JobRecordView};

const RECORD_COLUMNS: &str = "id, job_num, start_time, end_time, quantity, work_date, \
                              minutes, job_op_id, initials_id, created_at, updated_at";

/// Repository for job record database operations.
#[derive(Debug, Clone)]
pub struct JobRecordRepository {
    pool: SqlitePool,
}

impl JobRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn generate_id() -> String {
        format!("rec_{}", uuid::Uuid::new_v4())
    }

    /// Insert a record with a derived minutes value.
    #[instrument(skip(self, record), fields(job_num = %record.job_num))]
    pub async fn create(&self, record: &super::models::SubmitJobRecord, minutes: f64) -> Result<JobRecord> {
        let id = Self::generate_id();

        sqlx::query(
            "INSERT INTO job_records \
             (id, job_num, start_time, end_time, quantity, work_date, minutes, job_op_id, initials_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&record.job_num)
        .bind(&record.start_time)
        .bind(&record.end_time)
        .bind(record.quantity)
        .bind(&record.work_date)
        .bind(minutes)
        .bind(record.job_op_id)
        .bind(&record.initials_id)
        .execute(&self.pool)
        .await
        .context("Failed to insert job record")?;

        info!(id = %id, "Created job record");
        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Job record not found after creation"))
    }

    /// Get a record by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<JobRecord>> {
        sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM job_records WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch job record")
    }

    /// List all records joined with their lookup names, newest first.
    #[instrument(skip(self))]
    pub async fn list_views(&self) -> Result<Vec<JobRecordView>> {
        sqlx::query_as::<_, JobRecordView>(
            "SELECT r.id, r.job_num, r.start_time, r.end_time, r.quantity, r.work_date, \
                    r.minutes, r.job_op_id, o.op_name, r.initials_id, i.name AS initials_name \
             FROM job_records r \
             JOIN job_ops o ON o.id = r.job_op_id \
             JOIN initials i ON i.id = r.initials_id \
             ORDER BY r.work_date DESC, r.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list job records")
    }

    /// Overwrite a record's submitted fields and derived minutes.
    #[instrument(skip(self, record))]
    pub async fn update(
        &self,
        id: &str,
        record: &super::models::SubmitJobRecord,
        minutes: f64,
    ) -> Result<JobRecord> {
        let result = sqlx::query(
            "UPDATE job_records SET job_num = ?, start_time = ?, end_time = ?, quantity = ?, \
             work_date = ?, minutes = ?, job_op_id = ?, initials_id = ?, \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&record.job_num)
        .bind(&record.start_time)
        .bind(&record.end_time)
        .bind(record.quantity)
        .bind(&record.work_date)
        .bind(minutes)
        .bind(record.job_op_id)
        .bind(&record.initials_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update job record")?;

        if result.rows_affected() == 0 {
            bail!("Job record not found: {}", id);
        }

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Job record not found after update"))
    }

    /// Delete a record.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM job_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete job record")?;

        if result.rows_affected() == 0 {
            bail!("Job record not found: {}", id);
        }

        info!(id = %id, "Deleted job record");
        Ok(())
    }
}
