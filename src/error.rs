use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::{Conflict, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("API key limit reached: at most {limit} keys allowed")]
    QuotaExceeded { limit: i64 },

    #[error("{}", conflict_message(.0))]
    Duplicate(Conflict),

    /// Admin setup attempted after an admin already exists
    #[error("Admin user already exists. Setup is complete.")]
    SetupComplete,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

fn conflict_message(conflict: &Conflict) -> &'static str {
    match conflict {
        Conflict::Account => "Username or email already exists",
        Conflict::ProjectName => "Project name already exists, please choose another name",
        Conflict::DeviceMac => "Device MAC address already authorized in this project",
        Conflict::ApiKeyToken | Conflict::ProjectSerial => "Generated identifier collided",
    }
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(resource.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::QuotaExceeded { .. } => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) | AppError::SetupComplete => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind for clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Validation(_) => "validation",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::Duplicate(Conflict::Account) => "duplicate_account",
            AppError::Duplicate(Conflict::ProjectName) => "duplicate_name",
            AppError::Duplicate(Conflict::DeviceMac) => "duplicate_device",
            AppError::Duplicate(_) => "duplicate",
            AppError::SetupComplete => "setup_complete",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(conflict) => AppError::Duplicate(conflict),
            StoreError::QuotaExceeded { limit } => AppError::QuotaExceeded { limit },
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation failed: {}", errors))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": message,
                "kind": self.kind(),
            })),
        )
            .into_response()
    }
}
