use crate::handlers::{
    auth::login,
    health::health_check,
    method_not_allowed,
    roles::{create_role, delete_role, get_role, list_roles, restore_role, update_role},
    route_not_found,
    students::signup,
    users::{
        create_user, delete_user, get_user, list_users, restore_user, update_user,
        update_user_status,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check).fallback(method_not_allowed))
        // Login and public signup
        .route("/api/v1/auth/login", post(login).fallback(method_not_allowed))
        .route("/api/v1/students/signup", post(signup).fallback(method_not_allowed))
        // Role routes
        .route(
            "/api/v1/roles",
            get(list_roles).post(create_role).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/roles/:role_id",
            get(get_role)
                .put(update_role)
                .delete(delete_role)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/roles/:role_id/restore",
            post(restore_role).fallback(method_not_allowed),
        )
        // User routes
        .route(
            "/api/v1/users",
            get(list_users).post(create_user).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/users/:user_id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/users/:user_id/status",
            patch(update_user_status).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/users/:user_id/restore",
            post(restore_user).fallback(method_not_allowed),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
