//! Authentication and authorization error types.

use thiserror::Error;

use super::resolver::ResolveError;
use super::verifier::VerifyError;

/// Failures of the request authorization pipeline.
///
/// Every variant normalizes to Deny at the pipeline boundary; the
/// variant itself is retained for logging and HTTP status mapping only.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header was attached to the request.
    #[error("missing credential")]
    MissingCredential,

    /// The header was present but not a well-formed bearer credential.
    #[error("malformed authorization header")]
    MalformedHeader,

    /// The identity provider rejected the credential.
    #[error("credential verification failed: {0}")]
    Verification(#[from] VerifyError),

    /// The profile store could not be reached for role resolution.
    #[error("role resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    /// Identity and roles resolved, but no required role is held.
    #[error("subject {subject} lacks required roles")]
    InsufficientRoles {
        subject: String,
        required: Vec<String>,
        held: Vec<String>,
    },
}

impl AuthError {
    /// Whether this failure is an authentication failure (401) as
    /// opposed to an authorization failure (403).
    pub fn is_authentication(&self) -> bool {
        !matches!(self, AuthError::InsufficientRoles { .. })
    }
}

/// Setup-time configuration failures, rejected before request handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("operation declared with an empty required-role set")]
    EmptyRequiredRoles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_vs_authorization() {
        assert!(AuthError::MissingCredential.is_authentication());
        assert!(AuthError::Verification(VerifyError::Expired).is_authentication());
        assert!(
            AuthError::Resolution(ResolveError::Unavailable("down".into())).is_authentication()
        );

        let forbidden = AuthError::InsufficientRoles {
            subject: "u1".into(),
            required: vec!["administrator".into()],
            held: vec!["operator".into()],
        };
        assert!(!forbidden.is_authentication());
    }
}
