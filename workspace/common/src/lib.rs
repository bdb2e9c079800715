//! Common transport-layer types shared between the API and its clients.
//! Every endpoint answers with the same envelope: a `status` discriminator,
//! a human readable `message`, and either `data` or an `error` body.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ===================== Envelope =====================

/// Outcome discriminator of every response envelope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    RoleResponse = ApiResponse<RoleDto>,
    RoleListResponse = ApiResponse<Vec<RoleDto>>,
    UserResponse = ApiResponse<UserDto>,
    UserListResponse = ApiResponse<Vec<UserDto>>,
    UserStatusResponse = ApiResponse<UserStatusDto>,
    LoginResponse = ApiResponse<LoginDto>,
    StudentResponse = ApiResponse<StudentDto>
)]
pub struct ApiResponse<T> {
    /// Always `success` for this envelope
    pub status: ResponseStatus,
    /// Response message
    pub message: String,
    /// Response payload, absent for operations that return nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A success envelope without payload (e.g. after a hard delete).
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: None,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `error` for this envelope
    pub status: ResponseStatus,
    /// Short description of the failure
    pub message: String,
    /// Error details
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: ResponseStatus::Error,
            error: ErrorBody {
                message: message.clone(),
                errors: None,
            },
            message,
        }
    }

    /// Error envelope carrying every field-level validation failure.
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        let mut response = Self::new("Validation failed");
        response.error.errors = Some(issues);
        response
    }
}

/// Error details inside the error envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationIssue>>,
}

/// A single structural validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the offending field, e.g. `["password"]`
    pub path: Vec<String>,
    pub message: String,
    /// Machine readable code, e.g. `length`, `email`, `required`
    pub code: String,
}

// ===================== Roles =====================

/// Number of users referencing a role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
pub struct RoleCount {
    pub users: u64,
}

/// Role response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RoleDto {
    pub role_id: i32,
    pub role_name: String,
    pub description: Option<String>,
    pub status: bool,
    pub created_by: Option<i32>,
    pub modified_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "_count")]
    pub count: RoleCount,
}

/// How a DELETE request removes a role or user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Deactivate and keep the row
    #[default]
    Soft,
    /// Remove the row permanently
    Hard,
}

// ===================== Users =====================

/// Role name embedded in user responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RoleSummary {
    pub role_name: String,
}

/// User response model. The password hash is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserDto {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role_id: i32,
    pub role: Option<RoleSummary>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Result of the status-only user update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserStatusDto {
    pub user_id: i32,
    pub username: String,
    pub status: bool,
}

// ===================== Auth =====================

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LoginDto {
    pub user: UserDto,
    /// Dashboard the client should navigate to
    pub redirect_to: String,
}

// ===================== Students =====================

/// Student response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StudentDto {
    pub student_id: i32,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub avatar: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
