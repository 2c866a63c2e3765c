//! Identity verification: thin adapter over the token provider.
//!
//! The backend consumes the provider's verification result; it does not
//! reimplement signature machinery beyond configuring `jsonwebtoken`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use super::claims::Claims;

/// A successfully verified caller identity.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: Option<String>,
}

/// Typed verification failures.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// Malformed, unsigned or wrongly signed credential.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The credential's own lifetime has elapsed.
    #[error("token expired")]
    Expired,

    /// Signed by a different issuer or for a different audience.
    #[error("issuer or audience mismatch")]
    IssuerMismatch,

    /// The provider could not complete verification (network/timeout).
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// External identity provider contract.
///
/// One verification attempt per request, never retried by this layer;
/// any failure is normalized to Deny downstream.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a raw bearer credential and return the subject.
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, VerifyError>;
}

/// HS256 token verifier.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtVerifier {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, VerifyError> {
        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    VerifyError::IssuerMismatch
                }
                _ => VerifyError::InvalidToken(err.to_string()),
            },
        )?;

        Ok(VerifiedIdentity {
            subject: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Issues bearer tokens on sign-up and login.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: &str, audience: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issue a token for `subject`.
    pub fn issue(&self, subject: &str, email: Option<&str>) -> Result<String, VerifyError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: Some(now.timestamp()),
            email: email.map(str::to_string),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| VerifyError::InvalidToken(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, "jobtrack", "jobtrack", 60)
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(SECRET, "jobtrack", "jobtrack")
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let token = issuer().issue("usr_1", Some("op@example.com")).unwrap();
        let identity = verifier().verify(&token).await.unwrap();
        assert_eq!(identity.subject, "usr_1");
        assert_eq!(identity.email.as_deref(), Some("op@example.com"));
    }

    #[tokio::test]
    async fn test_malformed_token() {
        let err = verifier().verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_wrong_signature() {
        let token = TokenIssuer::new("other-secret", "jobtrack", "jobtrack", 60)
            .issue("usr_1", None)
            .unwrap();
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let token = TokenIssuer::new(SECRET, "jobtrack", "jobtrack", -5)
            .issue("usr_1", None)
            .unwrap();
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Expired));
    }

    #[tokio::test]
    async fn test_issuer_mismatch() {
        let token = TokenIssuer::new(SECRET, "someone-else", "jobtrack", 60)
            .issue("usr_1", None)
            .unwrap();
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::IssuerMismatch));
    }

    #[tokio::test]
    async fn test_audience_mismatch() {
        let token = TokenIssuer::new(SECRET, "jobtrack", "other-app", 60)
            .issue("usr_1", None)
            .unwrap();
        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::IssuerMismatch));
    }
}
