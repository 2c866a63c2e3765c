//! HTTP request handlers.

use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::{CurrentUser, SESSION_COOKIE};
use crate::catalog::{Initials, JobOp, RoleDef};
use crate::integrity::{Deletability, DependentSpec, EntityKey};
use crate::jobdata::{JobRecord, JobRecordView, SubmitJobRecord};
use crate::user::{UpdateUserRequest, UserInfo};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check endpoint.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Create an account and start a session.
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignUpRequest>,
) -> ApiResult<(CookieJar, Json<UserInfo>)> {
    let outcome = state
        .accounts
        .sign_up(&request.email, &request.password, &request.confirm_password)
        .await?;

    let jar = jar.add(session_cookie(outcome.session_id));
    Ok((jar, Json(outcome.user.into())))
}

/// Verify credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<UserInfo>)> {
    let Some(outcome) = state.accounts.login(&request.email, &request.password).await? else {
        return Err(ApiError::unauthorized("unauthorized"));
    };

    let jar = jar.add(session_cookie(outcome.session_id));
    Ok((jar, Json(outcome.user.into())))
}

/// Drop the session's credential and expire the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.accounts.logout(cookie.value());
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, StatusCode::NO_CONTENT)
}

/// The verified caller's identity and roles.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({
        "uid": user.subject,
        "email": user.email,
        "roles": user.roles,
    }))
}

// ---------------------------------------------------------------------------
// Lookups and job records
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LookupsResponse {
    pub operations: Vec<JobOp>,
    pub initials: Vec<Initials>,
}

/// Active operations and initials offered on the submission form.
pub async fn lookups(State(state): State<AppState>) -> ApiResult<Json<LookupsResponse>> {
    let operations = state.job_ops.list_active().await?;
    let initials = state.initials.list_active().await?;
    Ok(Json(LookupsResponse {
        operations,
        initials,
    }))
}

pub async fn list_records(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<JobRecordView>>> {
    Ok(Json(state.records.list().await?))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    state
        .records
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job record not found: {id}")))
}

pub async fn create_record(
    State(state): State<AppState>,
    Json(submit): Json<SubmitJobRecord>,
) -> ApiResult<(StatusCode, Json<JobRecord>)> {
    let record = state.records.create(submit).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(submit): Json<SubmitJobRecord>,
) -> ApiResult<Json<JobRecord>> {
    Ok(Json(state.records.update(&id, submit).await?))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.records.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin: job operations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateJobOpRequest {
    pub id: i64,
    pub op_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobOpRequest {
    pub op_name: String,
    pub active: bool,
}

pub async fn admin_list_job_ops(State(state): State<AppState>) -> ApiResult<Json<Vec<JobOp>>> {
    Ok(Json(state.job_ops.list().await?))
}

pub async fn admin_create_job_op(
    State(state): State<AppState>,
    Json(request): Json<CreateJobOpRequest>,
) -> ApiResult<(StatusCode, Json<JobOp>)> {
    let op = state.job_ops.create(request.id, &request.op_name).await?;
    Ok((StatusCode::CREATED, Json(op)))
}

pub async fn admin_update_job_op(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateJobOpRequest>,
) -> ApiResult<Json<JobOp>> {
    Ok(Json(
        state
            .job_ops
            .update(id, &request.op_name, request.active)
            .await?,
    ))
}

/// Delete an operation, refused while any job record references it.
pub async fn admin_delete_job_op(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.job_ops.get(id).await?.is_none() {
        return Err(ApiError::not_found(format!("Job operation not found: {id}")));
    }

    const DEPENDENTS: &[DependentSpec] = &[DependentSpec::equals("job_records", "job_op_id")];
    if let Deletability::InUse(count) = state
        .guard
        .check_deletable(&EntityKey::Int(id), DEPENDENTS)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "Operation {id} is still referenced by {count} job record(s)."
        )));
    }

    state.job_ops.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin: initials
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateInitialsRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInitialsRequest {
    pub name: String,
    pub active: bool,
}

pub async fn admin_list_initials(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Initials>>> {
    Ok(Json(state.initials.list().await?))
}

pub async fn admin_create_initials(
    State(state): State<AppState>,
    Json(request): Json<CreateInitialsRequest>,
) -> ApiResult<(StatusCode, Json<Initials>)> {
    let initials = state.initials.create(&request.name).await?;
    Ok((StatusCode::CREATED, Json(initials)))
}

/// Update initials. Retiring a set means `active: false` here; initials
/// have no delete endpoint.
pub async fn admin_update_initials(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateInitialsRequest>,
) -> ApiResult<Json<Initials>> {
    Ok(Json(
        state
            .initials
            .update(&id, &request.name, request.active)
            .await?,
    ))
}

// ---------------------------------------------------------------------------
// Admin: roles
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub role_id: String,
    pub role_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role_name: String,
}

pub async fn admin_list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<RoleDef>>> {
    Ok(Json(state.roles.list().await?))
}

pub async fn admin_create_role(
    State(state): State<AppState>,
    Json(request): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleDef>)> {
    let role = state.roles.create(&request.role_id, &request.role_name).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn admin_update_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleDef>> {
    Ok(Json(state.roles.update(&role_id, &request.role_name).await?))
}

/// Delete a role definition, refused while any user holds the role.
///
/// Membership is matched against the role *name*, since that is what
/// user role lists store.
pub async fn admin_delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let Some(role) = state.roles.get(&role_id).await? else {
        return Err(ApiError::not_found(format!("Role not found: {role_id}")));
    };

    const DEPENDENTS: &[DependentSpec] = &[DependentSpec::contains("users", "roles")];
    if let Deletability::InUse(count) = state
        .guard
        .check_deletable(&EntityKey::Text(role.role_name.clone()), DEPENDENTS)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "Role '{}' is still assigned to {count} user(s).",
            role.role_name
        )));
    }

    state.roles.delete(&role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin: users
// ---------------------------------------------------------------------------

pub async fn admin_list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserInfo>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

pub async fn admin_get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<UserInfo>> {
    state
        .users
        .get_user(&uid)
        .await?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found(format!("User not found: {uid}")))
}

pub async fn admin_update_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserInfo>> {
    let user = state.users.update_user(&uid, request).await?;
    Ok(Json(user.into()))
}

pub async fn admin_delete_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<StatusCode> {
    state.users.delete_user(&uid).await?;
    Ok(StatusCode::NO_CONTENT)
}
