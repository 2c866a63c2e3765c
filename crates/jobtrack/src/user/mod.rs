//! User profile management.
//!
//! Profiles live in the `users` collection keyed by subject id and
//! carry the role-name list consulted by the role gate.

mod models;
mod repository;
mod service;

pub use models::{CreateUserRequest, UpdateUserRequest, User, UserInfo};
pub use repository::UserRepository;
pub use service::UserService;
