use anyhow::anyhow;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

use super::{apply_delete_policy, MAX_GENERATION_ATTEMPTS};
use crate::config::DeletePolicy;
use crate::error::{AppError, AppResult};
use crate::models::project::{NewProject, Project, ProjectSummary};
use crate::store::{Conflict, Store, StoreError};

pub const PROJECT_SERIAL_LEN: usize = 16;
const MAX_PROJECT_NAME_LEN: usize = 100;

/// 16 characters drawn uniformly from `[a-zA-Z0-9]`
pub fn generate_project_serial<R: Rng>(rng: &mut R) -> String {
    (0..PROJECT_SERIAL_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

#[derive(Clone)]
pub struct ProjectManager {
    store: Arc<dyn Store>,
    delete_policy: DeletePolicy,
}

impl ProjectManager {
    pub fn new(store: Arc<dyn Store>, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            delete_policy,
        }
    }

    pub async fn list_projects(&self, user_id: i64) -> AppResult<Vec<ProjectSummary>> {
        Ok(self.store.list_projects(user_id).await?)
    }

    /// A project owned by `user_id`; `NotFound` for anyone else's
    pub async fn get_project(&self, user_id: i64, project_id: i64) -> AppResult<Project> {
        self.store
            .find_project(user_id, project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project"))
    }

    pub async fn create_project(
        &self,
        user_id: i64,
        name: &str,
        remark: Option<String>,
    ) -> AppResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Project name cannot be empty"));
        }
        if name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(AppError::validation(format!(
                "Project name must be at most {} characters",
                MAX_PROJECT_NAME_LEN
            )));
        }
        let remark = remark.unwrap_or_default();

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let project = NewProject {
                user_id,
                project_name: name.to_string(),
                project_serial: generate_project_serial(&mut rand::thread_rng()),
                created_at: Utc::now(),
                remark: remark.clone(),
            };

            match self.store.insert_project(project).await {
                Ok(created) => {
                    tracing::info!(user_id, project_id = created.id, "Project created");
                    return Ok(created);
                }
                Err(StoreError::AlreadyExists(Conflict::ProjectSerial)) => {
                    tracing::warn!(user_id, attempt, "Project serial collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(anyhow!(
            "could not generate a unique project serial after {} attempts",
            MAX_GENERATION_ATTEMPTS
        )
        .into())
    }

    /// Devices of the project go with it (store cascade)
    pub async fn delete_project(&self, user_id: i64, project_id: i64) -> AppResult<()> {
        let removed = self.store.delete_project(user_id, project_id).await?;
        tracing::info!(user_id, project_id, removed, "Project delete");
        apply_delete_policy(self.delete_policy, removed, "Project")
    }
}
