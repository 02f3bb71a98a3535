use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::{apply_delete_policy, ProjectManager};
use crate::config::DeletePolicy;
use crate::error::{AppError, AppResult};
use crate::models::device::{Device, NewDevice};
use crate::models::project::Project;
use crate::store::Store;

fn mac_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").expect("Invalid regex")
    })
}

/// Validate a MAC address and bring it to `XX:XX:XX:XX:XX:XX` uppercase.
///
/// Accepts six hex pairs separated by `:` or `-` in any letter case.
pub fn normalize_mac(raw: &str) -> AppResult<String> {
    let raw = raw.trim();
    if !mac_pattern().is_match(raw) {
        return Err(AppError::validation(
            "Invalid MAC address format, expected e.g. 00:1B:44:11:3A:B7",
        ));
    }
    Ok(raw.replace('-', ":").to_ascii_uppercase())
}

#[derive(Clone)]
pub struct DeviceManager {
    store: Arc<dyn Store>,
    projects: ProjectManager,
    delete_policy: DeletePolicy,
}

impl DeviceManager {
    pub fn new(store: Arc<dyn Store>, projects: ProjectManager, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            projects,
            delete_policy,
        }
    }

    /// Every device operation is scoped to a project the caller owns
    async fn owned_project(&self, user_id: i64, project_id: i64) -> AppResult<Project> {
        self.projects.get_project(user_id, project_id).await
    }

    pub async fn list_devices(&self, user_id: i64, project_id: i64) -> AppResult<Vec<Device>> {
        let project = self.owned_project(user_id, project_id).await?;
        Ok(self.store.list_devices(project.id).await?)
    }

    /// Authorize `mac` under the project. A MAC may appear in many projects
    /// but only once per project.
    pub async fn add_device(
        &self,
        user_id: i64,
        project_id: i64,
        mac: &str,
        remark: Option<String>,
    ) -> AppResult<Device> {
        let project = self.owned_project(user_id, project_id).await?;
        let device_mac = normalize_mac(mac)?;

        let device = self
            .store
            .insert_device(NewDevice {
                project_id: project.id,
                device_mac,
                authorized_at: Utc::now(),
                remark: remark.unwrap_or_default(),
            })
            .await?;

        tracing::info!(
            user_id,
            project_id,
            device_id = device.id,
            mac = %device.device_mac,
            "Device authorized"
        );
        Ok(device)
    }

    pub async fn remove_device(
        &self,
        user_id: i64,
        project_id: i64,
        device_id: i64,
    ) -> AppResult<()> {
        let project = self.owned_project(user_id, project_id).await?;
        let removed = self.store.delete_device(project.id, device_id).await?;
        tracing::info!(user_id, project_id, device_id, removed, "Device delete");
        apply_delete_policy(self.delete_policy, removed, "Device")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_colon_and_hyphen_forms() {
        assert_eq!(normalize_mac("00:1B:44:11:3A:B7").unwrap(), "00:1B:44:11:3A:B7");
        assert_eq!(normalize_mac("00-1B-44-11-3A-B7").unwrap(), "00:1B:44:11:3A:B7");
        assert_eq!(normalize_mac("00:1b:44:11:3a:b7").unwrap(), "00:1B:44:11:3A:B7");
        assert_eq!(normalize_mac(" 00-1b-44-11-3a-b7 ").unwrap(), "00:1B:44:11:3A:B7");
    }

    #[test]
    fn test_rejects_malformed() {
        for raw in [
            "00:1B:44:11:3A",
            "00:1B:44:11:3A:B7:C8",
            "001B44113AB7",
            "00:1B:44:11:3A:G7",
            "00.1B.44.11.3A.B7",
            "",
        ] {
            assert!(
                matches!(normalize_mac(raw), Err(AppError::Validation(_))),
                "{raw} should be rejected"
            );
        }
    }
}
