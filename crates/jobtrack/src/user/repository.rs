//! User repository for database operations.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    uid: String,
    email: String,
    password_hash: String,
    roles: String,
    created_at: String,
    updated_at: String,
    last_login_at: Option<String>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            uid: self.uid,
            email: self.email,
            password_hash: self.password_hash,
            roles: serde_json::from_str(&self.roles).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        }
    }
}

const USER_COLUMNS: &str =
    "uid, email, password_hash, roles, created_at, updated_at, last_login_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Generate a new user ID.
    fn generate_id() -> String {
        format!("usr_{}", nanoid::nanoid!(12))
    }

    /// Insert a new user with an already-hashed password.
    #[instrument(skip(self, password_hash, roles), fields(email = %email))]
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User> {
        let uid = Self::generate_id();
        let roles_json = serde_json::to_string(roles).context("serializing roles")?;

        debug!("Creating user: {} ({})", email, uid);

        sqlx::query(
            "INSERT INTO users (uid, email, password_hash, roles) VALUES (?, ?, ?, ?)",
        )
        .bind(&uid)
        .bind(email)
        .bind(password_hash)
        .bind(&roles_json)
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;

        self.get(&uid)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after creation"))
    }

    /// Get a user by subject id.
    #[instrument(skip(self))]
    pub async fn get(&self, uid: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE uid = ?"
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by email.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        Ok(row.map(UserRow::into_user))
    }

    /// List all users.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    /// Update a user's email.
    #[instrument(skip(self))]
    pub async fn update_email(&self, uid: &str, email: &str) -> Result<()> {
        sqlx::query("UPDATE users SET email = ?, updated_at = datetime('now') WHERE uid = ?")
            .bind(email)
            .bind(uid)
            .execute(&self.pool)
            .await
            .context("Failed to update user email")?;

        Ok(())
    }

    /// Replace a user's role set.
    #[instrument(skip(self, roles))]
    pub async fn update_roles(&self, uid: &str, roles: &[String]) -> Result<()> {
        let roles_json = serde_json::to_string(roles).context("serializing roles")?;

        sqlx::query("UPDATE users SET roles = ?, updated_at = datetime('now') WHERE uid = ?")
            .bind(&roles_json)
            .bind(uid)
            .execute(&self.pool)
            .await
            .context("Failed to update user roles")?;

        Ok(())
    }

    /// Update last login timestamp.
    #[instrument(skip(self))]
    pub async fn update_last_login(&self, uid: &str) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = datetime('now') WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await
            .context("Failed to update last login")?;

        Ok(())
    }

    /// Delete a user.
    #[instrument(skip(self))]
    pub async fn delete(&self, uid: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("User not found: {}", uid));
        }

        Ok(())
    }

    /// Check if an email is available.
    #[instrument(skip(self))]
    pub async fn is_email_available(&self, email: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check email availability")?;

        Ok(count.0 == 0)
    }
}
