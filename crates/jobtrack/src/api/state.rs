//! Application state shared across handlers.

use crate::auth::{AccountService, AuthState};
use crate::catalog::{InitialsRepository, JobOpRepository, RoleRepository};
use crate::integrity::ReferentialIntegrityGuard;
use crate::jobdata::JobRecordService;
use crate::user::UserService;

/// Shared application state.
///
/// Every service owns its own pool handle; the state carries no
/// separate database field.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub accounts: AccountService,
    pub users: UserService,
    pub job_ops: JobOpRepository,
    pub initials: InitialsRepository,
    pub roles: RoleRepository,
    pub records: JobRecordService,
    pub guard: ReferentialIntegrityGuard,
}
