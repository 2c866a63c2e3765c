//! User service for business logic.

use anyhow::{Context, Result, bail};
use tracing::{info, instrument, warn};

use super::models::{CreateUserRequest, UpdateUserRequest, User};
use super::repository::UserRepository;

/// Service for user management operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Create a new user with validation.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if !is_valid_email(&request.email) {
            bail!("Invalid email format.");
        }

        if request.password.len() < 6 {
            bail!("Password must be at least 6 characters.");
        }

        if !self.repo.is_email_available(&request.email).await? {
            bail!("Email '{}' is already registered.", request.email);
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repo
            .create(&request.email, &password_hash, &request.roles)
            .await?;
        info!(subject = %user.uid, "Created new user");

        Ok(user)
    }

    /// Get a user by subject id.
    #[instrument(skip(self))]
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>> {
        self.repo.get(uid).await
    }

    /// List all users.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.repo.list().await
    }

    /// Update a user's email and/or role set.
    #[instrument(skip(self, request))]
    pub async fn update_user(&self, uid: &str, request: UpdateUserRequest) -> Result<User> {
        if self.repo.get(uid).await?.is_none() {
            bail!("User not found: {}", uid);
        }

        if let Some(email) = &request.email {
            if !is_valid_email(email) {
                bail!("Invalid email format.");
            }
            if let Some(existing) = self.repo.get_by_email(email).await? {
                if existing.uid != uid {
                    bail!("Email '{}' is already registered.", email);
                }
            }
            self.repo.update_email(uid, email).await?;
        }

        if let Some(roles) = &request.roles {
            self.repo.update_roles(uid, roles).await?;
        }

        let user = self
            .repo
            .get(uid)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))?;
        info!(subject = %uid, "Updated user");

        Ok(user)
    }

    /// Delete a user.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, uid: &str) -> Result<()> {
        if self.repo.get(uid).await?.is_none() {
            bail!("User not found: {}", uid);
        }

        self.repo.delete(uid).await?;
        warn!(subject = %uid, "Deleted user");

        Ok(())
    }

    /// Verify login credentials, touching last-login on success.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.repo.get_by_email(email).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            self.repo.update_last_login(&user.uid).await?;
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    !parts[0].is_empty() && parts[1].contains('.')
}

/// Hash a password using bcrypt.
fn hash_password(password: &str) -> Result<String> {
    // Use a lower cost factor for development speed
    let cost = if cfg!(debug_assertions) { 4 } else { 10 };
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Verify a password against a bcrypt hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
