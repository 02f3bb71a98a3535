use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod store;

use services::{AccountService, ApiKeyManager, DeviceManager, ProjectManager};
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: config::Settings,
    pub accounts: AccountService,
    pub api_keys: ApiKeyManager,
    pub projects: ProjectManager,
    pub devices: DeviceManager,
}

impl AppState {
    /// Wire every manager to the one injected store
    pub fn new(store: Arc<dyn Store>, config: config::Settings) -> Self {
        let policy = config.delete_policy;
        let projects = ProjectManager::new(store.clone(), policy);
        Self {
            accounts: AccountService::new(store.clone(), config.clone()),
            api_keys: ApiKeyManager::new(store.clone(), policy),
            devices: DeviceManager::new(store.clone(), projects.clone(), policy),
            projects,
            store,
            config,
        }
    }
}

/// Create the main Axum application router
pub async fn create_app(state: AppState) -> Router {
    // Register API documentation
    let openapi = openapi::ApiDoc::openapi();

    Router::new()
        .nest("/api", routes::api::api_router())
        // Serve Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
