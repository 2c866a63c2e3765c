//! Job record service: validation and derived fields.

use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime};
use tracing::instrument;

use crate::catalog::{InitialsRepository, JobOpRepository};

use super::models::{JobRecord, JobRecordView, SubmitJobRecord};
use super::repository::JobRecordRepository;

/// Service for submitting and editing job records.
#[derive(Debug, Clone)]
pub struct JobRecordService {
    repo: JobRecordRepository,
    job_ops: JobOpRepository,
    initials: InitialsRepository,
}

impl JobRecordService {
    pub fn new(
        repo: JobRecordRepository,
        job_ops: JobOpRepository,
        initials: InitialsRepository,
    ) -> Self {
        Self {
            repo,
            job_ops,
            initials,
        }
    }

    /// List all records with their lookup names.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<JobRecordView>> {
        self.repo.list_views().await
    }

    /// Get a record by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<JobRecord>> {
        self.repo.get(id).await
    }

    /// Validate and create a record.
    ///
    /// New records may only reference *active* operations and initials.
    #[instrument(skip(self, submit), fields(job_num = %submit.job_num))]
    pub async fn create(&self, submit: SubmitJobRecord) -> Result<JobRecord> {
        let minutes = self.validate(&submit, None).await?;
        self.repo.create(&submit, minutes).await
    }

    /// Validate and overwrite a record.
    ///
    /// A reference the record already holds stays valid even if the
    /// entity was deactivated since; only *changing* a reference is
    /// restricted to active entities.
    #[instrument(skip(self, submit))]
    pub async fn update(&self, id: &str, submit: SubmitJobRecord) -> Result<JobRecord> {
        let Some(existing) = self.repo.get(id).await? else {
            bail!("Job record not found: {}", id);
        };

        let minutes = self.validate(&submit, Some(&existing)).await?;
        self.repo.update(id, &submit, minutes).await
    }

    /// Delete a record.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete(id).await
    }

    /// Check fields and references; returns the derived duration.
    async fn validate(
        &self,
        submit: &SubmitJobRecord,
        existing: Option<&JobRecord>,
    ) -> Result<f64> {
        if submit.job_num.trim().is_empty() {
            bail!("Invalid job record: job number must not be empty.");
        }
        if submit.quantity < 0 {
            bail!("Invalid job record: quantity cannot be negative.");
        }
        if NaiveDate::parse_from_str(&submit.work_date, "%Y-%m-%d").is_err() {
            bail!("Invalid job record: work date must be YYYY-MM-DD.");
        }

        let minutes = minutes_between(&submit.start_time, &submit.end_time)?;

        let Some(op) = self.job_ops.get(submit.job_op_id).await? else {
            bail!("Invalid job record: operation {} does not exist.", submit.job_op_id);
        };
        let op_unchanged = existing.is_some_and(|e| e.job_op_id == submit.job_op_id);
        if !op.active && !op_unchanged {
            bail!("Invalid job record: operation {} is not active.", submit.job_op_id);
        }

        let Some(initials) = self.initials.get(&submit.initials_id).await? else {
            bail!(
                "Invalid job record: initials {} do not exist.",
                submit.initials_id
            );
        };
        let initials_unchanged = existing.is_some_and(|e| e.initials_id == submit.initials_id);
        if !initials.active && !initials_unchanged {
            bail!(
                "Invalid job record: initials {} are not active.",
                submit.initials_id
            );
        }

        Ok(minutes)
    }
}

/// Minutes from `start` to `end`, both HH:MM on the same day.
fn minutes_between(start: &str, end: &str) -> Result<f64> {
    let start_time = NaiveTime::parse_from_str(start, "%H:%M")
        .map_err(|_| anyhow::anyhow!("Invalid job record: start time must be HH:MM."))?;
    let end_time = NaiveTime::parse_from_str(end, "%H:%M")
        .map_err(|_| anyhow::anyhow!("Invalid job record: end time must be HH:MM."))?;

    let difference = end_time.signed_duration_since(start_time);
    if difference.num_minutes() < 0 {
        bail!("Invalid job record: end time must be after start time.");
    }

    Ok(difference.num_minutes() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn service() -> JobRecordService {
        let db = Database::in_memory().await.unwrap();
        let pool = db.pool().clone();

        let job_ops = JobOpRepository::new(pool.clone());
        let initials = InitialsRepository::new(pool.clone());
        job_ops.create(1, "Turning").await.unwrap();
        job_ops.create(2, "Milling").await.unwrap();
        job_ops.update(2, "Milling", false).await.unwrap();
        initials.create("ABC").await.unwrap();

        JobRecordService::new(JobRecordRepository::new(pool), job_ops, initials)
    }

    async fn first_initials_id(service: &JobRecordService) -> String {
        service.initials.list().await.unwrap()[0].id.clone()
    }

    fn submit(op: i64, initials_id: &str) -> SubmitJobRecord {
        SubmitJobRecord {
            job_num: "J-100".to_string(),
            start_time: "08:00".to_string(),
            end_time: "09:30".to_string(),
            quantity: 25,
            work_date: "2024-03-01".to_string(),
            job_op_id: op,
            initials_id: initials_id.to_string(),
        }
    }

    #[test]
    fn test_minutes_between() {
        assert_eq!(minutes_between("08:00", "09:30").unwrap(), 90.0);
        assert_eq!(minutes_between("08:00", "08:00").unwrap(), 0.0);
        assert!(minutes_between("09:00", "08:00").is_err());
        assert!(minutes_between("8 am", "09:00").is_err());
    }

    #[tokio::test]
    async fn test_create_derives_minutes() {
        let service = service().await;
        let initials_id = first_initials_id(&service).await;

        let record = service.create(submit(1, &initials_id)).await.unwrap();
        assert_eq!(record.minutes, 90.0);
        assert_eq!(record.job_op_id, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_inactive_operation() {
        let service = service().await;
        let initials_id = first_initials_id(&service).await;

        let err = service.create(submit(2, &initials_id)).await.unwrap_err();
        assert!(err.to_string().contains("not active"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_references() {
        let service = service().await;
        let initials_id = first_initials_id(&service).await;

        assert!(service.create(submit(99, &initials_id)).await.is_err());
        assert!(service.create(submit(1, "ini_missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_end_before_start() {
        let service = service().await;
        let initials_id = first_initials_id(&service).await;

        let mut bad = submit(1, &initials_id);
        bad.start_time = "10:00".to_string();
        bad.end_time = "09:00".to_string();

        let err = service.create(bad).await.unwrap_err();
        assert!(err.to_string().contains("end time must be after"));
    }

    #[tokio::test]
    async fn test_update_keeps_now_inactive_reference() {
        let service = service().await;
        let initials_id = first_initials_id(&service).await;

        let record = service.create(submit(1, &initials_id)).await.unwrap();

        // Operation 1 goes inactive after the record was created.
        service.job_ops.update(1, "Turning", false).await.unwrap();

        // Editing without changing the operation still works.
        let mut edit = submit(1, &initials_id);
        edit.quantity = 30;
        let updated = service.update(&record.id, edit).await.unwrap();
        assert_eq!(updated.quantity, 30);

        // Switching *to* the inactive operation from elsewhere fails.
        let other = service
            .create(submit(1, &initials_id))
            .await
            .unwrap_err();
        assert!(other.to_string().contains("not active"));
    }

    #[tokio::test]
    async fn test_list_joins_lookup_names() {
        let service = service().await;
        let initials_id = first_initials_id(&service).await;
        service.create(submit(1, &initials_id)).await.unwrap();

        let views = service.list().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].op_name, "Turning");
        assert_eq!(views[0].initials_name, "ABC");
    }
}
