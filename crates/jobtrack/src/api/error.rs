//! Unified API error handling with structured responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Categorize an anyhow error from the service layer.
    ///
    /// Patterns recognized:
    /// - "not found" -> NotFound
    /// - "already in use" / "already registered" -> Conflict
    /// - "invalid" / "must be" / "cannot" -> BadRequest
    /// - "unavailable" -> ServiceUnavailable
    /// - Default -> Internal
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let msg = err.to_string();
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("not found") {
            ApiError::NotFound(msg)
        } else if msg_lower.contains("already in use") || msg_lower.contains("already registered")
        {
            ApiError::Conflict(msg)
        } else if msg_lower.contains("invalid")
            || msg_lower.contains("must be")
            || msg_lower.contains("cannot")
            || msg_lower.contains("does not exist")
            || msg_lower.contains("do not exist")
        {
            ApiError::BadRequest(msg)
        } else if msg_lower.contains("unavailable") {
            ApiError::ServiceUnavailable(msg)
        } else {
            ApiError::Internal(msg)
        }
    }
}

/// Structured error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::Internal(msg) => {
                error!(error_code = code, message = %msg, "API error");
            }
            ApiError::ServiceUnavailable(msg) => {
                warn!(error_code = code, message = %msg, "Service unavailable");
            }
            _ => {
                tracing::debug!(error_code = code, message = %message, "Client error");
            }
        }

        let body = ErrorResponse {
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Convert anyhow errors to API errors using the centralized categorization logic.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::from_anyhow(err)
    }
}

/// Convert pipeline failures to API errors.
///
/// Every authentication-side failure collapses to one generic
/// "unauthorized" body; the specific reason stays in the logs.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_authentication() {
            ApiError::Unauthorized("unauthorized".to_string())
        } else {
            ApiError::Forbidden("forbidden".to_string())
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ResolveError, VerifyError};

    #[test]
    fn test_error_categorization_not_found() {
        let err = anyhow::anyhow!("Job record not found: abc123");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::NotFound(_)));
    }

    #[test]
    fn test_error_categorization_conflict() {
        let err = anyhow::anyhow!("Operation id 7 is already in use; highest id currently in use is 12.");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::Conflict(_)));

        let err = anyhow::anyhow!("Email 'user@example.com' is already registered.");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::Conflict(_)));
    }

    #[test]
    fn test_error_categorization_bad_request() {
        let err = anyhow::anyhow!("Invalid job record: end time must be after start time.");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::BadRequest(_)));

        let err = anyhow::anyhow!("Password must be at least 6 characters.");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::BadRequest(_)));
    }

    #[test]
    fn test_error_categorization_unavailable() {
        let err = anyhow::anyhow!("profile store unavailable: connection closed");
        assert!(matches!(
            ApiError::from_anyhow(err),
            ApiError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_error_categorization_internal_default() {
        let err = anyhow::anyhow!("Something went wrong");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::Internal(_)));
    }

    #[test]
    fn test_auth_errors_collapse_to_unauthorized() {
        for err in [
            AuthError::MissingCredential,
            AuthError::MalformedHeader,
            AuthError::Verification(VerifyError::Expired),
            AuthError::Verification(VerifyError::ProviderUnavailable("timeout".into())),
            AuthError::Resolution(ResolveError::Unavailable("down".into())),
        ] {
            let api: ApiError = err.into();
            assert!(matches!(api, ApiError::Unauthorized(_)));
            // The body never carries the failure detail.
            assert_eq!(api.to_string(), "Unauthorized: unauthorized");
        }
    }

    #[test]
    fn test_insufficient_roles_is_forbidden() {
        let api: ApiError = AuthError::InsufficientRoles {
            subject: "u1".into(),
            required: vec!["administrator".into()],
            held: vec!["operator".into()],
        }
        .into();
        assert!(matches!(api, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_error_response_status_codes() {
        assert_eq!(ApiError::not_found("").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::unauthorized("").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("").status_code(), StatusCode::CONFLICT);
    }
}
