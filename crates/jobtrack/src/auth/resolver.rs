//! Role resolution from the profile store.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

/// Role resolution failures.
///
/// A missing profile is *not* a failure: it degrades to an empty role
/// set so that authorization denies without leaking whether the subject
/// exists. Only an unreachable store is an error.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a subject's current role set from the profile store.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    pool: SqlitePool,
}

impl RoleResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the subject's role names.
    ///
    /// Resolved fresh on every request, never cached, so role edits
    /// take effect immediately.
    #[instrument(skip(self))]
    pub async fn resolve(&self, subject: &str) -> Result<Vec<String>, ResolveError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT roles FROM users WHERE uid = ?")
                .bind(subject)
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| ResolveError::Unavailable(err.to_string()))?;

        let Some((roles_json,)) = row else {
            return Ok(Vec::new());
        };

        // A corrupt roles column degrades to no permissions rather than
        // failing the pipeline.
        Ok(serde_json::from_str(&roles_json).unwrap_or_default())
    }
}
