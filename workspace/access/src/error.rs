use std::fmt;

use common::ValidationIssue;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

/// Unique field that a create or update collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Username,
    Email,
    RoleName,
}

impl ConflictField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictField::Username => "username",
            ConflictField::Email => "email",
            ConflictField::RoleName => "role_name",
        }
    }

    /// Default client-facing message for a collision on this field.
    pub fn message(&self) -> &'static str {
        match self {
            ConflictField::Username => "Username already exists",
            ConflictField::Email => "Email already exists",
            ConflictField::RoleName => "Role name already exists",
        }
    }

    /// Guesses the colliding column from a database constraint message.
    fn from_constraint_message(message: &str) -> Option<Self> {
        let message = message.to_lowercase();
        if message.contains("role_name") {
            Some(ConflictField::RoleName)
        } else if message.contains("username") {
            Some(ConflictField::Username)
        } else if message.contains("email") {
            Some(ConflictField::Email)
        } else {
            None
        }
    }
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of every failed access-control or lifecycle operation.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Login credentials were missing or wrong. The message never says which.
    #[error("Invalid username or password")]
    Unauthenticated,

    /// The actor may not perform the action, or the target is protected.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Structural validation failed; carries every field issue.
    #[error("Validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("{0}")]
    NotFound(String),

    /// A unique username, email or role name is already taken.
    #[error("{message}")]
    Conflict {
        field: ConflictField,
        message: String,
    },

    /// The entity is in a state that forbids the transition, e.g. a role
    /// that still has users assigned.
    #[error("{0}")]
    StateConflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

impl AccessError {
    pub fn conflict(field: ConflictField) -> Self {
        AccessError::Conflict {
            field,
            message: field.message().to_string(),
        }
    }

    /// Translates a failed write. Constraint violations surface as the same
    /// conflict the advisory pre-checks report; anything else is internal.
    pub fn from_write(err: DbErr, fallback: ConflictField) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                let field = ConflictField::from_constraint_message(&message).unwrap_or(fallback);
                warn!(%field, "Unique constraint rejected write: {}", message);
                AccessError::conflict(field)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                warn!("Foreign key constraint rejected write: {}", message);
                AccessError::StateConflict(
                    "The record is still referenced by other records".to_string(),
                )
            }
            _ => {
                error!("Database write failed: {}", err);
                AccessError::Database(err)
            }
        }
    }

    /// True for failures whose details must stay server-side.
    pub fn is_internal(&self) -> bool {
        matches!(self, AccessError::Database(_) | AccessError::Hashing(_))
    }
}

impl From<bcrypt::BcryptError> for AccessError {
    fn from(err: bcrypt::BcryptError) -> Self {
        let err = AccessError::Hashing(err.to_string());
        error!(?err, "Password hashing failed");
        err
    }
}

/// Type alias for Result with AccessError
pub type Result<T> = std::result::Result<T, AccessError>;
