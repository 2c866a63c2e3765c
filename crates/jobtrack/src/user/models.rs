//! User profile models.

use serde::{Deserialize, Serialize};

/// A user profile.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role names; membership here is what the role gate evaluates.
    pub roles: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
}

/// Public view of a user, safe to return from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            roles: user.roles,
        }
    }
}

/// Request to create a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Request to update a user's profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
}
