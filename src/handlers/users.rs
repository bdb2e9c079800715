use access::UserLifecycle;
use access::permission::{Action, ensure_actor_allowed};
use access::validation::{CreateUserInput, UpdateUserInput, UpdateUserStatusInput, UserListQuery};
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::Json,
};
use axum_valid::{Valid, ValidRejection};
use common::{ApiResponse, DeleteMode, UserDto, UserStatusDto};
use tracing::{debug, info, instrument, trace};

use crate::error::ApiError;
use crate::extract::{CurrentActor, PathParam, Payload, QueryParams};
use crate::schemas::{AppState, DeleteQuery};

/// Entity name used in forbidden messages.
const ENTITY: &str = "users";

/// List users, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = common::UserListResponse),
        (status = 400, description = "Invalid pagination parameters", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Valid<Query<UserListQuery>>, ValidRejection<QueryRejection>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    trace!("Entering list_users function");
    let Valid(Query(query)) = query?;
    debug!(
        "Listing users: page {}, limit {}, include_deleted {:?}",
        query.page(),
        query.limit(),
        query.include_deleted
    );

    let users = UserLifecycle::new(&state.db, &state.hasher)
        .list(query)
        .await?;
    debug!("Retrieved {} users", users.len());
    Ok(Json(ApiResponse::success("Users retrieved successfully", users)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = common::UserResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = UserLifecycle::new(&state.db, &state.hasher)
        .get(user_id)
        .await?;
    Ok(Json(ApiResponse::success("User retrieved successfully", user)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserInput,
    params(
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 201, description = "User created successfully", body = common::UserResponse),
        (status = 400, description = "Validation failed", body = common::ErrorResponse),
        (status = 403, description = "Not allowed to create this user", body = common::ErrorResponse),
        (status = 409, description = "Username or email already exists", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    input: Result<Payload<CreateUserInput>, ApiError>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    trace!("Entering create_user function");
    ensure_actor_allowed(actor.as_ref(), Action::Create, ENTITY)?;
    let Payload(input) = input?;
    let user = UserLifecycle::new(&state.db, &state.hasher)
        .create(actor.as_ref(), input)
        .await?;
    info!("User created successfully with ID: {}, username: {}", user.user_id, user.username);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User created successfully", user)),
    ))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    request_body = UpdateUserInput,
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = common::UserResponse),
        (status = 400, description = "Validation failed", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, or the user holds the protected role", body = common::ErrorResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 409, description = "Username or email already exists", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(user_id): PathParam<i32>,
    input: Result<Payload<UpdateUserInput>, ApiError>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    ensure_actor_allowed(actor.as_ref(), Action::Edit, ENTITY)?;
    let Payload(input) = input?;
    let user = UserLifecycle::new(&state.db, &state.hasher)
        .update(actor.as_ref(), user_id, input)
        .await?;
    Ok(Json(ApiResponse::success("User updated successfully", user)))
}

/// Activate or deactivate a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/status",
    tag = "users",
    request_body = UpdateUserStatusInput,
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "User status updated successfully", body = common::UserStatusResponse),
        (status = 400, description = "Validation failed", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, or the user holds the protected role", body = common::ErrorResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn update_user_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(user_id): PathParam<i32>,
    input: Result<Payload<UpdateUserStatusInput>, ApiError>,
) -> Result<Json<ApiResponse<UserStatusDto>>, ApiError> {
    ensure_actor_allowed(actor.as_ref(), Action::Edit, ENTITY)?;
    let Payload(input) = input?;
    let result = UserLifecycle::new(&state.db, &state.hasher)
        .set_status(actor.as_ref(), user_id, input)
        .await?;
    let message = if result.status {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(Json(ApiResponse::success(message, result)))
}

/// Delete a user, softly by default
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        DeleteQuery,
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "User deactivated or deleted", body = common::UserResponse),
        (status = 400, description = "User already deleted, or still referenced by roles", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, protected target, or self-deletion", body = common::ErrorResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(user_id): PathParam<i32>,
    QueryParams(query): QueryParams<DeleteQuery>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let users = UserLifecycle::new(&state.db, &state.hasher);
    match query.mode.unwrap_or_default() {
        DeleteMode::Soft => {
            let user = users.soft_delete(actor.as_ref(), user_id).await?;
            Ok(Json(ApiResponse::success("User deactivated successfully", user)))
        }
        DeleteMode::Hard => {
            users.hard_delete(actor.as_ref(), user_id).await?;
            Ok(Json(ApiResponse::message_only("User deleted permanently")))
        }
    }
}

/// Restore a soft-deleted user
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/restore",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "User restored successfully", body = common::UserResponse),
        (status = 400, description = "User is not deleted", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, or the user holds the protected role", body = common::ErrorResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 409, description = "Username or email now taken by another user", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn restore_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(user_id): PathParam<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = UserLifecycle::new(&state.db, &state.hasher)
        .restore(actor.as_ref(), user_id)
        .await?;
    Ok(Json(ApiResponse::success("User restored successfully", user)))
}
