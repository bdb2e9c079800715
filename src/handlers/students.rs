use access::StudentRegistry;
use access::validation::SignupInput;
use axum::{extract::State, http::StatusCode, response::Json};
use common::{ApiResponse, StudentDto};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::extract::Payload;
use crate::schemas::AppState;

/// Register a new student
#[utoipa::path(
    post,
    path = "/api/v1/students/signup",
    tag = "students",
    request_body = SignupInput,
    responses(
        (status = 201, description = "Student registered successfully", body = common::StudentResponse),
        (status = 400, description = "Validation failed", body = common::ErrorResponse),
        (status = 409, description = "Email already registered", body = common::ErrorResponse),
        (status = 500, description = "Internal server error", body = common::ErrorResponse)
    )
)]
#[instrument(skip(state, input))]
pub async fn signup(
    State(state): State<AppState>,
    Payload(input): Payload<SignupInput>,
) -> Result<(StatusCode, Json<ApiResponse<StudentDto>>), ApiError> {
    let student = StudentRegistry::new(&state.db).signup(input).await?;
    info!("Student {} registered", student.student_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Student registered successfully", student)),
    ))
}
