use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{IdQuery, MessageResponse};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::device::{AddDeviceRequest, Device};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceList {
    pub devices: Vec<Device>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceAdded {
    pub success: bool,
    pub message: String,
    pub device: Device,
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/devices",
    tag = "devices",
    params(("project_id" = i64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Devices authorized under the project", body = DeviceList),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(project_id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<DeviceList>> {
    let devices = state.devices.list_devices(user.user_id, project_id).await?;
    Ok(Json(DeviceList { devices }))
}

#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/devices",
    tag = "devices",
    params(("project_id" = i64, Path, description = "Project ID")),
    request_body = AddDeviceRequest,
    responses(
        (status = 201, description = "Device authorized", body = DeviceAdded),
        (status = 400, description = "Malformed MAC address"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "MAC already authorized in this project")
    )
)]
pub async fn add(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(project_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<AddDeviceRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let device = state
        .devices
        .add_device(user.user_id, project_id, &req.device_mac, req.remark)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DeviceAdded {
            success: true,
            message: "Device authorized".to_string(),
            device,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}/devices",
    tag = "devices",
    params(("project_id" = i64, Path, description = "Project ID"), IdQuery),
    responses(
        (status = 200, description = "Device removed", body = MessageResponse),
        (status = 400, description = "Missing id"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Project not found, or no such device (report_missing policy only)")
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(project_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<IdQuery>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    let device_id = query.require()?;
    state
        .devices
        .remove_device(user.user_id, project_id, device_id)
        .await?;
    Ok(Json(MessageResponse::ok("Device removed")))
}
