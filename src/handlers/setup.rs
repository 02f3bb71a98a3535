use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MessageResponse;
use crate::error::{AppError, AppResult};
use crate::services::accounts::RegisterRequest;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatus {
    /// True once an admin account exists
    pub is_setup_complete: bool,
}

#[utoipa::path(
    get,
    path = "/api/setup/check",
    tag = "setup",
    responses(
        (status = 200, description = "Setup status", body = SetupStatus)
    )
)]
pub async fn check(State(state): State<AppState>) -> AppResult<Json<SetupStatus>> {
    let is_setup_complete = state.accounts.is_setup_complete().await?;
    Ok(Json(SetupStatus { is_setup_complete }))
}

/// Create the initial admin account. Only allowed while none exists.
#[utoipa::path(
    post,
    path = "/api/setup/create-admin",
    tag = "setup",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin created", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Setup already completed")
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    state.accounts.create_admin(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Admin account created")),
    ))
}
