//! Credential bridge: projects the session-held credential onto the
//! request's `Authorization` header before identity verification runs.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::service::AuthState;

/// Name of the cookie carrying the opaque session id.
pub const SESSION_COOKIE: &str = "jobtrack_session";

/// Middleware run on every inbound request, authenticated or not.
///
/// If the caller's session holds a credential, the header is set to
/// exactly `Bearer <credential>`; otherwise the request passes through
/// untouched. Idempotent: re-running with no intervening store/clear
/// produces the same header.
pub async fn credential_bridge(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(credential) = auth.sessions.read(cookie.value()) {
            // Stored credentials are ASCII tokens; skip silently if one
            // somehow is not a valid header value rather than failing
            // the whole request.
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {credential}")) {
                req.headers_mut().insert(header::AUTHORIZATION, value);
            }
        }
    }

    next.run(req).await
}
