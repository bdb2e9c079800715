pub mod auth;
pub mod health;
pub mod roles;
pub mod students;
pub mod users;

use axum::http::Method;
use tracing::debug;

use crate::error::ApiError;

/// Answers methods a route does not support.
pub async fn method_not_allowed(method: Method) -> ApiError {
    debug!("Unsupported method {}", method);
    ApiError::MethodNotAllowed
}

/// Answers paths no route matches.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
