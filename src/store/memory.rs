use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{Conflict, Store, StoreError, StoreResult};
use crate::models::{
    api_key::{ApiKey, NewApiKey},
    device::{Device, NewDevice},
    project::{NewProject, Project, ProjectSummary},
    user::{NewUser, User},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    api_keys: Vec<ApiKey>,
    projects: Vec<Project>,
    devices: Vec<Device>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        if self
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::AlreadyExists(Conflict::Account));
        }

        let user = User {
            id: self.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        self.users.push(user.clone());
        Ok(user)
    }
}

/// Process-local `Store`. All tables sit behind one mutex, so every trait
/// method is atomic. Used by the test suite and by `serve --ephemeral`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Every mutation is a single push or retain, so a poisoned lock still
        // guards consistent tables.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.tables().insert_user(user)
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }

    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        Ok(self.tables().users.iter().any(|u| u.is_admin))
    }

    async fn create_first_admin(&self, user: NewUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.is_admin) {
            return Ok(None);
        }

        let admin = tables.insert_user(NewUser {
            is_admin: true,
            ..user
        })?;
        Ok(Some(admin))
    }

    async fn list_api_keys(&self, user_id: i64) -> StoreResult<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self
            .tables()
            .api_keys
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(keys)
    }

    async fn insert_api_key_within_quota(
        &self,
        key: NewApiKey,
        quota: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<ApiKey> {
        let mut tables = self.tables();

        let active = tables
            .api_keys
            .iter()
            .filter(|k| k.user_id == key.user_id && k.is_active_at(now))
            .count() as i64;
        if active >= quota {
            return Err(StoreError::QuotaExceeded { limit: quota });
        }

        if tables.api_keys.iter().any(|k| k.api_key == key.api_key) {
            return Err(StoreError::AlreadyExists(Conflict::ApiKeyToken));
        }

        let created = ApiKey {
            id: tables.next_id(),
            user_id: key.user_id,
            api_key: key.api_key,
            created_at: key.created_at,
            expires_at: key.expires_at,
            note: key.note,
        };
        tables.api_keys.push(created.clone());
        Ok(created)
    }

    async fn delete_api_key(&self, user_id: i64, key_id: i64) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.api_keys.len();
        tables
            .api_keys
            .retain(|k| !(k.id == key_id && k.user_id == user_id));
        Ok((before - tables.api_keys.len()) as u64)
    }

    async fn list_projects(&self, user_id: i64) -> StoreResult<Vec<ProjectSummary>> {
        let tables = self.tables();
        let mut projects: Vec<ProjectSummary> = tables
            .projects
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| {
                let device_count = tables
                    .devices
                    .iter()
                    .filter(|d| d.project_id == p.id)
                    .count() as i64;
                ProjectSummary::new(p.clone(), device_count)
            })
            .collect();
        projects.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(projects)
    }

    async fn find_project(&self, user_id: i64, project_id: i64) -> StoreResult<Option<Project>> {
        Ok(self
            .tables()
            .projects
            .iter()
            .find(|p| p.id == project_id && p.user_id == user_id)
            .cloned())
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut tables = self.tables();

        if tables
            .projects
            .iter()
            .any(|p| p.user_id == project.user_id && p.project_name == project.project_name)
        {
            return Err(StoreError::AlreadyExists(Conflict::ProjectName));
        }
        if tables
            .projects
            .iter()
            .any(|p| p.project_serial == project.project_serial)
        {
            return Err(StoreError::AlreadyExists(Conflict::ProjectSerial));
        }

        let created = Project {
            id: tables.next_id(),
            user_id: project.user_id,
            project_name: project.project_name,
            project_serial: project.project_serial,
            created_at: project.created_at,
            remark: project.remark,
        };
        tables.projects.push(created.clone());
        Ok(created)
    }

    async fn delete_project(&self, user_id: i64, project_id: i64) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.projects.len();
        tables
            .projects
            .retain(|p| !(p.id == project_id && p.user_id == user_id));
        let removed = (before - tables.projects.len()) as u64;

        if removed > 0 {
            tables.devices.retain(|d| d.project_id != project_id);
        }
        Ok(removed)
    }

    async fn list_devices(&self, project_id: i64) -> StoreResult<Vec<Device>> {
        Ok(self
            .tables()
            .devices
            .iter()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_device(&self, device: NewDevice) -> StoreResult<Device> {
        let mut tables = self.tables();

        if tables
            .devices
            .iter()
            .any(|d| d.project_id == device.project_id && d.device_mac == device.device_mac)
        {
            return Err(StoreError::AlreadyExists(Conflict::DeviceMac));
        }

        let created = Device {
            id: tables.next_id(),
            project_id: device.project_id,
            device_mac: device.device_mac,
            authorized_at: device.authorized_at,
            remark: device.remark,
        };
        tables.devices.push(created.clone());
        Ok(created)
    }

    async fn delete_device(&self, project_id: i64, device_id: i64) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.devices.len();
        tables
            .devices
            .retain(|d| !(d.id == device_id && d.project_id == project_id));
        Ok((before - tables.devices.len()) as u64)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
