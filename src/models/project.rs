use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    /// Unique project ID
    pub id: i64,
    /// Owner of the project
    pub user_id: i64,
    /// Project name, unique per owner
    pub project_name: String,
    /// Random 16-character external reference
    pub project_serial: String,
    pub created_at: DateTime<Utc>,
    pub remark: String,
}

/// Project row as listed on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectSummary {
    pub id: i64,
    pub user_id: i64,
    pub project_name: String,
    pub project_serial: String,
    pub created_at: DateTime<Utc>,
    pub remark: String,
    /// Number of devices authorized under the project
    pub device_count: i64,
}

impl ProjectSummary {
    pub fn new(project: Project, device_count: i64) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id,
            project_name: project.project_name,
            project_serial: project.project_serial,
            created_at: project.created_at,
            remark: project.remark,
            device_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: i64,
    pub project_name: String,
    pub project_serial: String,
    pub created_at: DateTime<Utc>,
    pub remark: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    /// Project name (1-100 characters once trimmed)
    pub project_name: String,
    /// Optional remark (max 500 characters)
    #[validate(length(max = 500))]
    pub remark: Option<String>,
}
