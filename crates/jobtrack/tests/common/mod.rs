//! Test utilities and common setup.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use jobtrack::api::{AppState, create_router};
use jobtrack::auth::{
    AccountService, AuthState, JwtVerifier, RoleResolver, SessionStore, TokenIssuer,
};
use jobtrack::catalog::{InitialsRepository, JobOpRepository, RoleRepository};
use jobtrack::db::Database;
use jobtrack::integrity::ReferentialIntegrityGuard;
use jobtrack::jobdata::{JobRecordRepository, JobRecordService};
use jobtrack::user::{CreateUserRequest, User, UserRepository, UserService};

const SECRET: &str = "test-secret-for-integration-tests";
const ISSUER: &str = "jobtrack";
const AUDIENCE: &str = "jobtrack";

/// A fully wired application over an in-memory database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    issuer: TokenIssuer,
}

impl TestApp {
    /// Create a user profile directly in the store.
    pub async fn seed_user(&self, email: &str, roles: &[&str]) -> User {
        self.state
            .users
            .create_user(CreateUserRequest {
                email: email.to_string(),
                password: "password123".to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })
            .await
            .unwrap()
    }

    /// Seed a user and return a valid bearer token for them.
    pub async fn seed_user_with_token(&self, email: &str, roles: &[&str]) -> String {
        let user = self.seed_user(email, roles).await;
        self.token_for(&user)
    }

    /// Issue a valid bearer token for an existing user.
    pub fn token_for(&self, user: &User) -> String {
        self.issuer.issue(&user.uid, Some(&user.email)).unwrap()
    }

    /// A token whose lifetime has already elapsed.
    pub fn expired_token(&self) -> String {
        TokenIssuer::new(SECRET, ISSUER, AUDIENCE, -5)
            .issue("usr_expired", None)
            .unwrap()
    }
}

/// Create a test application with all services initialized.
pub async fn test_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let pool = db.pool().clone();

    let sessions = SessionStore::new(Duration::from_secs(30 * 60));
    let verifier = JwtVerifier::new(SECRET, ISSUER, AUDIENCE);
    let issuer = TokenIssuer::new(SECRET, ISSUER, AUDIENCE, 60);

    let auth = AuthState::new(
        Arc::new(verifier),
        RoleResolver::new(pool.clone()),
        sessions.clone(),
    );

    let users = UserService::new(UserRepository::new(pool.clone()));
    let accounts = AccountService::new(users.clone(), issuer.clone(), sessions);

    let job_ops = JobOpRepository::new(pool.clone());
    let initials = InitialsRepository::new(pool.clone());
    let records = JobRecordService::new(
        JobRecordRepository::new(pool.clone()),
        job_ops.clone(),
        initials.clone(),
    );

    let state = AppState {
        auth,
        accounts,
        users,
        job_ops,
        initials,
        roles: RoleRepository::new(pool.clone()),
        records,
        guard: ReferentialIntegrityGuard::new(pool),
    };

    TestApp {
        router: create_router(state.clone()).unwrap(),
        state,
        issuer,
    }
}
