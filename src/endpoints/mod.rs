pub mod jobs;
pub mod notifications;

use axum::Router;

use crate::config::CONFIG;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/system/version", axum::routing::get(get_version))
        .nest(
            "/api/agents/{agent_id}/notifications",
            notifications::notifications_routes(state.clone()),
        )
        .nest(
            "/api/agents/{agent_id}/preferences",
            notifications::preferences_routes(state.clone()),
        )
        .nest("/api/jobs", jobs::jobs_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": CONFIG.version,
        "backend": "rust"
    }))
}
