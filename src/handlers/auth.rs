use access::auth;
use access::validation::LoginInput;
use axum::{extract::State, response::Json};
use common::{ApiResponse, LoginDto};
use tracing::{instrument, trace};

use crate::error::ApiError;
use crate::extract::Payload;
use crate::schemas::AppState;

/// Log in with username (or email) and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Login successful", body = common::LoginResponse),
        (status = 400, description = "Malformed request body", body = common::ErrorResponse),
        (status = 401, description = "Invalid username or password", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn login(
    State(state): State<AppState>,
    Payload(input): Payload<LoginInput>,
) -> Result<Json<ApiResponse<LoginDto>>, ApiError> {
    trace!("Entering login function");
    let result = auth::login(&state.db, &state.hasher, input).await?;
    Ok(Json(ApiResponse::success("Login successful", result)))
}
