//! Access control and lifecycle rules of the admin dashboard.
//!
//! Every mutating operation follows the same order: resolve the actor,
//! check its role, validate the input, load the target, apply the
//! protected-role rule, check uniqueness, then write once.

pub mod auth;
pub mod error;
pub mod identity;
pub mod password;
pub mod permission;
pub mod role;
pub mod student;
pub mod uniqueness;
pub mod user;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{AccessError, ConflictField, Result};
pub use identity::{Actor, IdentityClaim, resolve_actor};
pub use password::{BcryptHasher, PasswordHasher, SharedHasher};
pub use role::RoleLifecycle;
pub use student::StudentRegistry;
pub use user::UserLifecycle;
