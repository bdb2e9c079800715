use access::AccessError;
use access::validation::issues_from_errors;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_valid::ValidRejection;
use common::ErrorResponse;
use thiserror::Error;
use tracing::{debug, error};

/// Every failure a handler can answer with. Rendered as the error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Invalid path parameter: {0}")]
    Path(#[from] PathRejection),

    #[error("Invalid query parameters: {0}")]
    Query(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Route not found")]
    RouteNotFound,
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Query(rejection.body_text())
    }
}

impl From<ValidRejection<QueryRejection>> for ApiError {
    fn from(rejection: ValidRejection<QueryRejection>) -> Self {
        match rejection {
            ValidRejection::Valid(errors) => {
                ApiError::Access(AccessError::Validation(issues_from_errors(&errors)))
            }
            ValidRejection::Inner(inner) => inner.into(),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Access(err) => match err {
                AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AccessError::Forbidden(_) => StatusCode::FORBIDDEN,
                AccessError::Validation(_) => StatusCode::BAD_REQUEST,
                AccessError::NotFound(_) => StatusCode::NOT_FOUND,
                AccessError::Conflict { .. } => StatusCode::CONFLICT,
                AccessError::StateConflict(_) => StatusCode::BAD_REQUEST,
                AccessError::Database(_) | AccessError::Hashing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Json(_) | ApiError::Path(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Access(AccessError::Validation(issues)) => {
                ErrorResponse::validation(issues.clone())
            }
            ApiError::Access(err) if err.is_internal() => ErrorResponse::new("Internal Server Error"),
            ApiError::Json(_) => ErrorResponse::new("Invalid JSON body"),
            other => ErrorResponse::new(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!(status = status.as_u16(), "Request rejected: {}", self);
        }
        (status, Json(self.to_error_response())).into_response()
    }
}
