use axum::{
    extract::{Query, State},
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
use crate::models::project::{CreateProjectRequest, Project, ProjectSummary};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectList {
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectCreated {
    pub success: bool,
    pub message: String,
    pub project: Project,
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    responses(
        (status = 200, description = "Projects of the session user with device counts", body = ProjectList),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ProjectList>> {
    let projects = state.projects.list_projects(user.user_id).await?;
    Ok(Json(ProjectList { projects }))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectCreated),
        (status = 400, description = "Invalid project name"),
        (status = 401, description = "No valid session"),
        (status = 409, description = "Project name already in use")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateProjectRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let project = state
        .projects
        .create_project(user.user_id, &req.project_name, req.remark)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectCreated {
            success: true,
            message: "Project created".to_string(),
            project,
        }),
    ))
}

/// Delete a project together with its devices
#[utoipa::path(
    delete,
    path = "/api/projects",
    tag = "projects",
    params(IdQuery),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 400, description = "Missing id"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No such project (report_missing policy only)")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<IdQuery>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    let project_id = query.require()?;
    state.projects.delete_project(user.user_id, project_id).await?;
    Ok(Json(MessageResponse::ok("Project deleted")))
}
