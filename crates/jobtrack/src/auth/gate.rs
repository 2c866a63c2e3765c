//! Role gate: per-operation Allow/Deny decisions.
//!
//! Protected route groups declare a non-empty `RequiredRoles` set at
//! router construction. At request time the gate runs the full
//! pipeline (header, verify, resolve) and evaluates the pure decision
//! function; any upstream failure has already been normalized to Deny
//! by the time a decision is produced.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::api::error::ApiError;

use super::error::{AuthError, ConfigError};
use super::service::AuthState;

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Data-only capability descriptor for a protected operation.
///
/// Construction rejects an empty role set: an operation nobody could
/// ever access is a configuration error, caught at setup rather than
/// silently denying every request.
#[derive(Debug, Clone)]
pub struct RequiredRoles {
    roles: Vec<String>,
}

impl RequiredRoles {
    pub fn new<I, S>(roles: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            return Err(ConfigError::EmptyRequiredRoles);
        }
        Ok(Self { roles })
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

/// Pure decision function: Allow iff the intersection of required and
/// resolved roles is non-empty.
pub fn decide(required: &RequiredRoles, resolved: &[String]) -> Decision {
    if required
        .roles
        .iter()
        .any(|role| resolved.iter().any(|held| held == role))
    {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// The verified caller, attached to the request for handlers.
///
/// Derived fresh per request; never cached across requests.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub subject: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

/// Gate middleware for a protected route group.
///
/// Wire with
/// `middleware::from_fn_with_state((auth, required), require_roles)`.
pub async fn require_roles(
    State((auth, required)): State<(AuthState, RequiredRoles)>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Only the headers cross the awaits below; holding the whole
    // request (its body is !Sync) would make this future non-Send.
    let user = match authorize(&auth, &required, req.headers()).await {
        Ok(user) => user,
        Err(err) => {
            match &err {
                AuthError::InsufficientRoles {
                    subject,
                    required,
                    held,
                } => {
                    warn!(
                        subject = %subject,
                        required = ?required,
                        held = ?held,
                        "access forbidden"
                    );
                }
                // Never log the credential itself.
                other => warn!(reason = %other, "authentication failed"),
            }
            return Err(err.into());
        }
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Run the pipeline: header -> verify -> resolve -> decide.
async fn authorize(
    auth: &AuthState,
    required: &RequiredRoles,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let credential = header_value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MalformedHeader)?;

    // One verification attempt, never retried.
    let identity = auth.provider.verify(credential).await?;
    let roles = auth.resolver.resolve(&identity.subject).await?;

    match decide(required, &roles) {
        Decision::Allow => Ok(CurrentUser {
            subject: identity.subject,
            email: identity.email,
            roles,
        }),
        Decision::Deny => Err(AuthError::InsufficientRoles {
            subject: identity.subject,
            required: required.roles().to_vec(),
            held: roles,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    use super::super::resolver::RoleResolver;
    use super::super::session::SessionStore;
    use super::super::verifier::{IdentityProvider, VerifiedIdentity, VerifyError};
    use super::*;
    use crate::db::Database;

    fn req(roles: &[&str]) -> RequiredRoles {
        RequiredRoles::new(roles.iter().copied()).unwrap()
    }

    fn held(roles: &[&str]) -> Vec<String> {
        roles.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_empty_required_set_rejected_at_setup() {
        let err = RequiredRoles::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRequiredRoles));
    }

    #[test]
    fn test_allow_iff_intersection_nonempty() {
        let required = req(&["administrator", "supervisor"]);

        assert_eq!(decide(&required, &held(&["operator"])), Decision::Deny);
        assert_eq!(
            decide(&required, &held(&["administrator"])),
            Decision::Allow
        );
        assert_eq!(
            decide(&required, &held(&["operator", "supervisor"])),
            Decision::Allow
        );
        assert_eq!(decide(&required, &held(&[])), Decision::Deny);
    }

    #[test]
    fn test_decision_is_pure_and_repeatable() {
        let required = req(&["operator"]);
        let resolved = held(&["operator"]);
        for _ in 0..3 {
            assert_eq!(decide(&required, &resolved), Decision::Allow);
        }
    }

    #[test]
    fn test_role_names_match_exactly() {
        let required = req(&["administrator"]);
        assert_eq!(decide(&required, &held(&["Administrator"])), Decision::Deny);
        assert_eq!(decide(&required, &held(&["admin"])), Decision::Deny);
    }

    struct FixedToken;

    #[async_trait]
    impl IdentityProvider for FixedToken {
        async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, VerifyError> {
            if credential == "good" {
                Ok(VerifiedIdentity {
                    subject: "usr_1".to_string(),
                    email: None,
                })
            } else {
                Err(VerifyError::InvalidToken("bad credential".to_string()))
            }
        }
    }

    async fn gated_app(required: RequiredRoles) -> Router {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (uid, email, password_hash, roles) VALUES (?, ?, ?, ?)")
            .bind("usr_1")
            .bind("op@example.com")
            .bind("hash")
            .bind(r#"["operator"]"#)
            .execute(db.pool())
            .await
            .unwrap();

        let auth = AuthState::new(
            Arc::new(FixedToken),
            RoleResolver::new(db.pool().clone()),
            SessionStore::new(std::time::Duration::from_secs(60)),
        );

        Router::new()
            .route("/guarded", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state((auth, required), require_roles))
    }

    async fn status(router: Router, bearer: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri("/guarded");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    /// The full pipeline run as a layered tower service: verify and
    /// resolve both await inside the middleware.
    #[tokio::test]
    async fn test_middleware_runs_pipeline_as_layer() {
        let app = gated_app(req(&["operator"])).await;
        assert_eq!(status(app.clone(), Some("good")).await, StatusCode::OK);
        assert_eq!(
            status(app.clone(), Some("forged")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(app, None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_denies_missing_role() {
        let app = gated_app(req(&["administrator"])).await;
        assert_eq!(status(app, Some("good")).await, StatusCode::FORBIDDEN);
    }
}
