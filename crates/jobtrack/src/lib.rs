//! Jobtrack backend library.
//!
//! Role-gated record keeping: operators submit timed job records against
//! shared lookup tables; supervisors and administrators manage records,
//! users and the lookup tables themselves.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod db;
pub mod integrity;
pub mod jobdata;
pub mod settings;
pub mod user;
