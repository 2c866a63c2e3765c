//! Assignable initials lookup table.
//!
//! Initials have no hard delete: retiring a set of initials means
//! deactivating it, which hides it from new assignments while keeping
//! every historical record resolvable.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, instrument};

/// A set of operator initials assignable to job records.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Initials {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Repository for initials database operations.
#[derive(Debug, Clone)]
pub struct InitialsRepository {
    pool: SqlitePool,
}

impl InitialsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn generate_id() -> String {
        format!("ini_{}", nanoid::nanoid!(12))
    }

    /// List all initials.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Initials>> {
        sqlx::query_as::<_, Initials>("SELECT id, name, active FROM initials ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list initials")
    }

    /// List only the initials offered for new assignments.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Initials>> {
        sqlx::query_as::<_, Initials>(
            "SELECT id, name, active FROM initials WHERE active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active initials")
    }

    /// Get initials by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Initials>> {
        sqlx::query_as::<_, Initials>("SELECT id, name, active FROM initials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch initials")
    }

    /// Create new initials; the name must not be in use.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<Initials> {
        let in_use: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM initials WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check initials availability")?;

        if in_use.0 > 0 {
            bail!("Initials '{}' are already in use.", name);
        }

        let id = Self::generate_id();
        sqlx::query("INSERT INTO initials (id, name, active) VALUES (?, ?, TRUE)")
            .bind(&id)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to insert initials")?;

        info!(id = %id, "Created initials");
        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Initials not found after creation"))
    }

    /// Update the name and active flag.
    #[instrument(skip(self))]
    pub async fn update(&self, id: &str, name: &str, active: bool) -> Result<Initials> {
        let result = sqlx::query("UPDATE initials SET name = ?, active = ? WHERE id = ?")
            .bind(name)
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update initials")?;

        if result.rows_affected() == 0 {
            bail!("Initials not found: {}", id);
        }

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Initials not found after update"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn repo() -> InitialsRepository {
        let db = Database::in_memory().await.unwrap();
        InitialsRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;
        let created = repo.create("ABC").await.unwrap();
        assert!(created.active);
        assert!(created.id.starts_with("ini_"));

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "ABC");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = repo().await;
        repo.create("ABC").await.unwrap();

        let err = repo.create("ABC").await.unwrap_err();
        assert!(err.to_string().contains("already in use"));
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_active_list() {
        let repo = repo().await;
        let a = repo.create("ABC").await.unwrap();
        repo.create("XYZ").await.unwrap();

        repo.update(&a.id, "ABC", false).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "XYZ");

        // Deactivated initials are still resolvable by id.
        assert!(repo.get(&a.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let repo = repo().await;
        assert!(repo.update("ini_missing", "ABC", true).await.is_err());
    }
}
