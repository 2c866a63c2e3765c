//! Account service: sign-up, login and sign-out.
//!
//! The server-side session store is the single source of truth for the
//! issued credential; the browser only ever holds the opaque session
//! id. Login failures collapse to one generic "unauthorized" so the
//! response does not reveal whether the email exists.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, instrument};

use crate::user::{CreateUserRequest, User, UserService};

use super::resolver::RoleResolver;
use super::session::SessionStore;
use super::verifier::{IdentityProvider, TokenIssuer};

/// Role granted to every newly signed-up user.
const DEFAULT_ROLE: &str = "operator";

/// Authentication state shared by the bridge and gate middleware.
#[derive(Clone)]
pub struct AuthState {
    /// External identity provider (fake in tests).
    pub provider: Arc<dyn IdentityProvider>,
    /// Role resolution against the profile store.
    pub resolver: RoleResolver,
    /// Server-held session credentials.
    pub sessions: SessionStore,
}

impl AuthState {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        resolver: RoleResolver,
        sessions: SessionStore,
    ) -> Self {
        Self {
            provider,
            resolver,
            sessions,
        }
    }
}

/// Result of a successful sign-up or login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Opaque session id to hand to the browser.
    pub session_id: String,
    pub user: User,
}

/// Sign-up/login/sign-out orchestration.
#[derive(Clone)]
pub struct AccountService {
    users: UserService,
    issuer: TokenIssuer,
    sessions: SessionStore,
}

impl AccountService {
    pub fn new(users: UserService, issuer: TokenIssuer, sessions: SessionStore) -> Self {
        Self {
            users,
            issuer,
            sessions,
        }
    }

    /// Create the identity and profile, then start a session.
    ///
    /// New users get the default role set `{"operator"}`.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<LoginOutcome> {
        if password != confirm_password {
            bail!("Invalid sign-up: the passwords didn't match.");
        }

        let user = self
            .users
            .create_user(CreateUserRequest {
                email: email.to_string(),
                password: password.to_string(),
                roles: vec![DEFAULT_ROLE.to_string()],
            })
            .await?;

        let outcome = self.start_session(user)?;
        info!(subject = %outcome.user.uid, "user signed up");
        Ok(outcome)
    }

    /// Verify credentials and start a session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<LoginOutcome>> {
        let Some(user) = self.users.verify_credentials(email, password).await? else {
            return Ok(None);
        };

        let outcome = self.start_session(user)?;
        info!(subject = %outcome.user.uid, "user logged in");
        Ok(Some(outcome))
    }

    /// Drop the session's credential immediately.
    #[instrument(skip(self))]
    pub fn logout(&self, session_id: &str) {
        self.sessions.clear(session_id);
        info!("session cleared");
    }

    fn start_session(&self, user: User) -> Result<LoginOutcome> {
        let token = self
            .issuer
            .issue(&user.uid, Some(&user.email))
            .context("issuing bearer token")?;

        let session_id = SessionStore::generate_id();
        self.sessions.store(&session_id, token);

        Ok(LoginOutcome { session_id, user })
    }
}
