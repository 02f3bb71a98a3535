use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub mod api_keys;
pub mod auth;
pub mod devices;
pub mod health;
pub mod projects;
pub mod setup;

/// `?id=` selector used by the delete endpoints
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    /// Identifier of the record to delete
    pub id: Option<i64>,
}

impl IdQuery {
    pub fn require(&self) -> AppResult<i64> {
        self.id.ok_or_else(|| AppError::validation("Missing id parameter"))
    }
}

/// Acknowledgement body for writes that return nothing else
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
