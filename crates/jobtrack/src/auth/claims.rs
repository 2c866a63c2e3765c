//! JWT claims for issued bearer credentials.

use serde::{Deserialize, Serialize};

/// Claims carried by a jobtrack bearer token.
///
/// Role membership is deliberately absent: roles are resolved from the
/// profile store on every request so that an edit by an administrator
/// takes effect without waiting for token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: String,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Issued at (as Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// User's email.
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip() {
        let claims = Claims {
            sub: "usr_1".to_string(),
            iss: "jobtrack".to_string(),
            aud: "jobtrack".to_string(),
            exp: 4102444800,
            iat: Some(1700000000),
            email: Some("op@example.com".to_string()),
        };

        let json = serde_json::to_string(&claims).unwrap();
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, "usr_1");
        assert_eq!(back.email.as_deref(), Some("op@example.com"));
    }

    #[test]
    fn test_claims_optional_fields_default() {
        let json = r#"{"sub":"u","iss":"jobtrack","aud":"jobtrack","exp":0}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.iat.is_none());
        assert!(claims.email.is_none());
    }
}
