//! Shared lookup tables: job operations, assignable initials, roles.
//!
//! These are the reference entities other records point at by key.
//! Deletes of operations and roles go through the referential
//! integrity guard; initials are deactivated instead of deleted so
//! historical records stay resolvable.

mod initials;
mod job_ops;
mod roles;

pub use initials::{Initials, InitialsRepository};
pub use job_ops::{JobOp, JobOpRepository};
pub use roles::{RoleDef, RoleRepository};
