use access::RoleLifecycle;
use access::permission::{Action, ensure_actor_allowed};
use access::validation::{CreateRoleInput, UpdateRoleInput};
use axum::{extract::State, http::StatusCode, response::Json};
use common::{ApiResponse, DeleteMode, RoleDto};
use tracing::{debug, info, instrument, trace};

use crate::error::ApiError;
use crate::extract::{CurrentActor, PathParam, Payload, QueryParams};
use crate::schemas::{AppState, DeleteQuery};

/// Entity name used in forbidden messages.
const ENTITY: &str = "roles";

/// List all roles with their user counts
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "roles",
    responses(
        (status = 200, description = "Roles retrieved successfully", body = common::RoleListResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    trace!("Entering list_roles function");
    let roles = RoleLifecycle::new(&state.db).list().await?;
    debug!("Retrieved {} roles", roles.len());
    Ok(Json(ApiResponse::success("Roles retrieved successfully", roles)))
}

/// Get a role by ID
#[utoipa::path(
    get,
    path = "/api/v1/roles/{role_id}",
    tag = "roles",
    params(
        ("role_id" = i32, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role retrieved successfully", body = common::RoleResponse),
        (status = 404, description = "Role not found", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    PathParam(role_id): PathParam<i32>,
) -> Result<Json<ApiResponse<RoleDto>>, ApiError> {
    let role = RoleLifecycle::new(&state.db).get(role_id).await?;
    Ok(Json(ApiResponse::success("Role retrieved successfully", role)))
}

/// Create a new role
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    tag = "roles",
    request_body = CreateRoleInput,
    params(
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 201, description = "Role created successfully", body = common::RoleResponse),
        (status = 400, description = "Validation failed", body = common::ErrorResponse),
        (status = 403, description = "Not allowed to create roles", body = common::ErrorResponse),
        (status = 409, description = "Role name already exists", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn create_role(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    input: Result<Payload<CreateRoleInput>, ApiError>,
) -> Result<(StatusCode, Json<ApiResponse<RoleDto>>), ApiError> {
    trace!("Entering create_role function");
    ensure_actor_allowed(actor.as_ref(), Action::Create, ENTITY)?;
    let Payload(input) = input?;
    let role = RoleLifecycle::new(&state.db)
        .create(actor.as_ref(), input)
        .await?;
    info!("Role {} created with ID {}", role.role_name, role.role_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Role created successfully", role)),
    ))
}

/// Update a role
#[utoipa::path(
    put,
    path = "/api/v1/roles/{role_id}",
    tag = "roles",
    request_body = UpdateRoleInput,
    params(
        ("role_id" = i32, Path, description = "Role ID"),
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "Role updated successfully", body = common::RoleResponse),
        (status = 400, description = "Validation failed", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, or the role is protected", body = common::ErrorResponse),
        (status = 404, description = "Role not found", body = common::ErrorResponse),
        (status = 409, description = "Role name already exists", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn update_role(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(role_id): PathParam<i32>,
    input: Result<Payload<UpdateRoleInput>, ApiError>,
) -> Result<Json<ApiResponse<RoleDto>>, ApiError> {
    ensure_actor_allowed(actor.as_ref(), Action::Edit, ENTITY)?;
    let Payload(input) = input?;
    let role = RoleLifecycle::new(&state.db)
        .update(actor.as_ref(), role_id, input)
        .await?;
    Ok(Json(ApiResponse::success("Role updated successfully", role)))
}

/// Delete a role, softly by default
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{role_id}",
    tag = "roles",
    params(
        ("role_id" = i32, Path, description = "Role ID"),
        DeleteQuery,
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "Role deactivated or deleted", body = common::RoleResponse),
        (status = 400, description = "Role still has users assigned, or is already inactive", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, or the role is protected", body = common::ErrorResponse),
        (status = 404, description = "Role not found", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_role(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(role_id): PathParam<i32>,
    QueryParams(query): QueryParams<DeleteQuery>,
) -> Result<Json<ApiResponse<RoleDto>>, ApiError> {
    let roles = RoleLifecycle::new(&state.db);
    match query.mode.unwrap_or_default() {
        DeleteMode::Soft => {
            let role = roles.soft_delete(actor.as_ref(), role_id).await?;
            Ok(Json(ApiResponse::success("Role deactivated successfully", role)))
        }
        DeleteMode::Hard => {
            roles.hard_delete(actor.as_ref(), role_id).await?;
            Ok(Json(ApiResponse::message_only("Role deleted permanently")))
        }
    }
}

/// Restore a soft-deleted role
#[utoipa::path(
    post,
    path = "/api/v1/roles/{role_id}/restore",
    tag = "roles",
    params(
        ("role_id" = i32, Path, description = "Role ID"),
        ("x-user-id" = i32, Header, description = "ID of the acting user"),
        ("x-role-id" = i32, Header, description = "Role ID of the acting user")
    ),
    responses(
        (status = 200, description = "Role restored successfully", body = common::RoleResponse),
        (status = 400, description = "Role is not deleted", body = common::ErrorResponse),
        (status = 403, description = "Not allowed, or the role is protected", body = common::ErrorResponse),
        (status = 404, description = "Role not found", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn restore_role(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(role_id): PathParam<i32>,
) -> Result<Json<ApiResponse<RoleDto>>, ApiError> {
    let role = RoleLifecycle::new(&state.db)
        .restore(actor.as_ref(), role_id)
        .await?;
    Ok(Json(ApiResponse::success("Role restored successfully", role)))
}
