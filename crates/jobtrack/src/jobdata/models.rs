//! Job record models.

use serde::{Deserialize, Serialize};

/// A stored job record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: String,
    pub job_num: String,
    /// Shift times in HH:MM.
    pub start_time: String,
    pub end_time: String,
    pub quantity: i64,
    /// Work date in YYYY-MM-DD.
    pub work_date: String,
    /// Duration derived from start/end, stored for reporting.
    pub minutes: f64,
    pub job_op_id: i64,
    pub initials_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A record joined with its lookup names for listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JobRecordView {
    pub id: String,
    pub job_num: String,
    pub start_time: String,
    pub end_time: String,
    pub quantity: i64,
    pub work_date: String,
    pub minutes: f64,
    pub job_op_id: i64,
    pub op_name: String,
    pub initials_id: String,
    pub initials_name: String,
}

/// Fields submitted when creating or editing a record.
///
/// `minutes` is never submitted; it is derived server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitJobRecord {
    pub job_num: String,
    pub start_time: String,
    pub end_time: String,
    pub quantity: i64,
    pub work_date: String,
    pub job_op_id: i64,
    pub initials_id: String,
}
