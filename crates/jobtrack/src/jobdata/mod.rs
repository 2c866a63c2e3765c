//! Timed job records.
//!
//! Each record references a job operation and a set of initials by key,
//! which is what makes those lookup rows deletion-constrained.

mod models;
mod repository;
mod service;

pub use models::{JobRecord, JobRecordView, SubmitJobRecord};
pub use repository::JobRecordRepository;
pub use service::JobRecordService;
