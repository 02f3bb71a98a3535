use utoipa::OpenApi;
use crate::handlers::{
    api_keys,
    auth,
    devices,
    health,
    projects,
    setup,
    MessageResponse,
};
use crate::models::{
    api_key::{ApiKeyResponse, CreateApiKeyRequest},
    device::{AddDeviceRequest, Device},
    project::{CreateProjectRequest, Project, ProjectSummary},
    user::UserResponse,
};
use crate::services::accounts::{LoginRequest, RegisterRequest};

/// Generate the OpenAPI documentation for the entire API
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        health::check,

        // Setup endpoints
        setup::check,
        setup::create_admin,

        // Auth endpoints
        auth::register,
        auth::login,
        auth::logout,
        auth::me,

        // API key endpoints
        api_keys::list,
        api_keys::create,
        api_keys::delete,

        // Project endpoints
        projects::list,
        projects::create,
        projects::delete,

        // Device endpoints
        devices::list,
        devices::add,
        devices::remove,
    ),
    components(
        schemas(
            health::HealthResponse,
            setup::SetupStatus,
            MessageResponse,

            // User schemas
            UserResponse,
            RegisterRequest,
            LoginRequest,
            auth::LoginResponse,
            auth::LogoutResponse,
            auth::MeResponse,

            // API key schemas
            ApiKeyResponse,
            CreateApiKeyRequest,
            api_keys::ApiKeyList,
            api_keys::ApiKeyCreated,

            // Project schemas
            Project,
            ProjectSummary,
            CreateProjectRequest,
            projects::ProjectList,
            projects::ProjectCreated,

            // Device schemas
            Device,
            AddDeviceRequest,
            devices::DeviceList,
            devices::DeviceAdded,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "setup", description = "First-run admin setup"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "api-keys", description = "API key management"),
        (name = "projects", description = "Project management"),
        (name = "devices", description = "Device authorization per project"),
    )
)]
pub struct ApiDoc;
