use access::SharedHasher;
use access::validation::{
    CreateRoleInput, CreateUserInput, LoginInput, SignupInput, UpdateRoleInput, UpdateUserInput,
    UpdateUserStatusInput,
};
use common::{
    DeleteMode, ErrorBody, ErrorResponse, LoginDto, LoginResponse, ResponseStatus, RoleCount,
    RoleDto, RoleListResponse, RoleResponse, RoleSummary, StudentDto, StudentResponse, UserDto,
    UserListResponse, UserResponse, UserStatusDto, UserStatusResponse, ValidationIssue,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Password hashing used by user writes and login
    pub hasher: SharedHasher,
}

/// Query parameters of the delete endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// `soft` (default) deactivates, `hard` removes the row
    pub mode: Option<DeleteMode>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::students::signup,
        crate::handlers::roles::list_roles,
        crate::handlers::roles::get_role,
        crate::handlers::roles::create_role,
        crate::handlers::roles::update_role,
        crate::handlers::roles::delete_role,
        crate::handlers::roles::restore_role,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::update_user_status,
        crate::handlers::users::delete_user,
        crate::handlers::users::restore_user,
    ),
    components(
        schemas(
            RoleResponse,
            RoleListResponse,
            UserResponse,
            UserListResponse,
            UserStatusResponse,
            LoginResponse,
            StudentResponse,
            ErrorResponse,
            ErrorBody,
            ValidationIssue,
            ResponseStatus,
            HealthResponse,
            RoleDto,
            RoleCount,
            RoleSummary,
            UserDto,
            UserStatusDto,
            LoginDto,
            StudentDto,
            DeleteMode,
            CreateRoleInput,
            UpdateRoleInput,
            CreateUserInput,
            UpdateUserInput,
            UpdateUserStatusInput,
            LoginInput,
            SignupInput,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Dashboard login"),
        (name = "students", description = "Public student registration"),
        (name = "roles", description = "Role management"),
        (name = "users", description = "User management"),
    ),
    info(
        title = "LearnHub Admin API",
        description = "Role-based administration of the LearnHub learning platform: roles, users, login and student signup",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
