//! Role definition lookup table.
//!
//! Role definitions are what administrators assign to users; the role
//! gate compares against the *names*, so a definition referenced by any
//! user's role list must not be deleted.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, instrument};

/// A role definition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleDef {
    pub role_id: String,
    pub role_name: String,
}

/// Repository for role definition database operations.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all role definitions.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RoleDef>> {
        sqlx::query_as::<_, RoleDef>("SELECT role_id, role_name FROM roles ORDER BY role_name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list roles")
    }

    /// All role names, for the user-edit picker.
    #[instrument(skip(self))]
    pub async fn list_names(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT role_name FROM roles ORDER BY role_name")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list role names")?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Get a role definition by id.
    #[instrument(skip(self))]
    pub async fn get(&self, role_id: &str) -> Result<Option<RoleDef>> {
        sqlx::query_as::<_, RoleDef>("SELECT role_id, role_name FROM roles WHERE role_id = ?")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch role")
    }

    /// Create a role definition; the id must not be in use.
    #[instrument(skip(self))]
    pub async fn create(&self, role_id: &str, role_name: &str) -> Result<RoleDef> {
        if self.get(role_id).await?.is_some() {
            bail!("Role id '{}' is already in use.", role_id);
        }

        sqlx::query("INSERT INTO roles (role_id, role_name) VALUES (?, ?)")
            .bind(role_id)
            .bind(role_name)
            .execute(&self.pool)
            .await
            .context("Failed to insert role")?;

        info!(role_id, "Created role");
        self.get(role_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Role not found after creation"))
    }

    /// Update a role definition's name.
    #[instrument(skip(self))]
    pub async fn update(&self, role_id: &str, role_name: &str) -> Result<RoleDef> {
        let result = sqlx::query("UPDATE roles SET role_name = ? WHERE role_id = ?")
            .bind(role_name)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .context("Failed to update role")?;

        if result.rows_affected() == 0 {
            bail!("Role not found: {}", role_id);
        }

        self.get(role_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Role not found after update"))
    }

    /// Delete a role definition.
    ///
    /// Callers must check deletability through the integrity guard
    /// first; this method performs the raw store mutation only.
    #[instrument(skip(self))]
    pub async fn delete(&self, role_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM roles WHERE role_id = ?")
            .bind(role_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete role")?;

        if result.rows_affected() == 0 {
            bail!("Role not found: {}", role_id);
        }

        info!(role_id, "Deleted role");
        Ok(())
    }
}
