use crate::handlers;
use crate::AppState;
use axum::{routing::get, Router};

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::check))
        // Mount first-run setup under /setup prefix
        .nest("/setup", super::setup::setup_router())
        // Mount auth routes under /auth prefix
        .nest("/auth", super::auth::auth_router())
        .nest("/api-keys", super::api_keys::api_key_router())
        // Devices live under their project: /projects/:project_id/devices
        .nest("/projects", super::projects::project_router())
}
