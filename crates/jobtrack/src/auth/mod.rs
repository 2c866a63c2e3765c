//! Authentication and authorization module.
//!
//! Request pipeline: the credential bridge projects the session-held
//! bearer credential onto the request, the verifier establishes the
//! subject, the resolver loads the subject's roles, and the role gate
//! decides Allow/Deny per protected operation. Every upstream failure
//! is normalized to Deny.

mod bridge;
mod claims;
mod error;
mod gate;
mod resolver;
mod service;
mod session;
mod verifier;

pub use bridge::{SESSION_COOKIE, credential_bridge};
pub use claims::Claims;
pub use error::{AuthError, ConfigError};
pub use gate::{CurrentUser, Decision, RequiredRoles, decide, require_roles};
pub use resolver::{ResolveError, RoleResolver};
pub use service::{AccountService, AuthState, LoginOutcome};
pub use session::SessionStore;
pub use verifier::{IdentityProvider, JwtVerifier, TokenIssuer, VerifiedIdentity, VerifyError};
