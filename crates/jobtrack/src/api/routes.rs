//! API route definitions.
//!
//! Protected routes are grouped by the role set they require; each
//! group carries its own gate layer. The credential bridge wraps the
//! whole router so the session credential is projected onto the
//! `Authorization` header before any gate runs.

use anyhow::Result;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{RequiredRoles, credential_bridge, require_roles};

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Result<Router> {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let auth = state.auth.clone();

    let operator = RequiredRoles::new(["operator", "supervisor", "administrator"])?;
    let supervisor = RequiredRoles::new(["supervisor", "administrator"])?;
    let administrator = RequiredRoles::new(["administrator"])?;

    // Any authenticated role: identity, submission form lookups, and
    // submitting new records.
    let operator_routes = Router::new()
        .route("/me", get(handlers::me))
        .route("/lookups", get(handlers::lookups))
        .route("/records", post(handlers::create_record))
        .route_layer(middleware::from_fn_with_state(
            (auth.clone(), operator),
            require_roles,
        ));

    // Supervisors review and correct submitted records.
    let supervisor_routes = Router::new()
        .route("/records", get(handlers::list_records))
        .route("/records/{id}", get(handlers::get_record))
        .route("/records/{id}", put(handlers::update_record))
        .route_layer(middleware::from_fn_with_state(
            (auth.clone(), supervisor),
            require_roles,
        ));

    // Administrators manage the lookup tables, users, and deletions.
    let admin_routes = Router::new()
        .route("/records/{id}", delete(handlers::delete_record))
        .route(
            "/admin/job-ops",
            get(handlers::admin_list_job_ops).post(handlers::admin_create_job_op),
        )
        .route(
            "/admin/job-ops/{id}",
            put(handlers::admin_update_job_op).delete(handlers::admin_delete_job_op),
        )
        .route(
            "/admin/initials",
            get(handlers::admin_list_initials).post(handlers::admin_create_initials),
        )
        .route("/admin/initials/{id}", put(handlers::admin_update_initials))
        .route(
            "/admin/roles",
            get(handlers::admin_list_roles).post(handlers::admin_create_role),
        )
        .route(
            "/admin/roles/{role_id}",
            put(handlers::admin_update_role).delete(handlers::admin_delete_role),
        )
        .route("/admin/users", get(handlers::admin_list_users))
        .route(
            "/admin/users/{uid}",
            get(handlers::admin_get_user)
                .put(handlers::admin_update_user)
                .delete(handlers::admin_delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            (auth.clone(), administrator),
            require_roles,
        ));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(handlers::sign_up))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .merge(operator_routes)
        .merge(supervisor_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(auth, credential_bridge))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state);

    Ok(router)
}
