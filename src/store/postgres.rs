use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Conflict, Store, StoreError, StoreResult};
use crate::models::{
    api_key::{ApiKey, NewApiKey},
    device::{Device, NewDevice},
    project::{NewProject, Project, ProjectSummary},
    user::{NewUser, User},
};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, created_at";
const API_KEY_COLUMNS: &str = "id, user_id, api_key, created_at, expires_at, note";
const PROJECT_COLUMNS: &str = "id, user_id, project_name, project_serial, created_at, remark";
const DEVICE_COLUMNS: &str = "id, project_id, device_mac, authorized_at, remark";

// Serializes first-run admin creation across connections
const ADMIN_SETUP_LOCK: i64 = 0x6b65_7968_7562;

/// `Store` backed by the PostgreSQL schema in `migrations/`
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique-constraint violation into the conflict it represents
fn map_write_error(err: sqlx::Error) -> StoreError {
    let conflict = match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            match db_err.constraint() {
                Some("users_username_key") | Some("users_email_key") => Some(Conflict::Account),
                Some("api_keys_api_key_key") => Some(Conflict::ApiKeyToken),
                Some("projects_user_name_key") => Some(Conflict::ProjectName),
                Some("projects_project_serial_key") => Some(Conflict::ProjectSerial),
                Some("devices_project_mac_key") => Some(Conflict::DeviceMac),
                _ => None,
            }
        }
        _ => None,
    };

    match conflict {
        Some(conflict) => StoreError::AlreadyExists(conflict),
        None => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, is_admin)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1 LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = TRUE)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_first_admin(&self, user: NewUser) -> StoreResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADMIN_SETUP_LOCK)
            .execute(&mut *tx)
            .await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = TRUE)",
        )
        .fetch_one(&mut *tx)
        .await?;

        if exists {
            return Ok(None);
        }

        let admin = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, is_admin)
             VALUES ($1, $2, $3, TRUE)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(Some(admin))
    }

    async fn list_api_keys(&self, user_id: i64) -> StoreResult<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn insert_api_key_within_quota(
        &self,
        key: NewApiKey,
        quota: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<ApiKey> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the owner serializes concurrent creates for one user
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(key.user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_keys WHERE user_id = $1 AND expires_at > $2",
        )
        .bind(key.user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if active >= quota {
            tracing::debug!(user_id = key.user_id, active, "API key quota reached");
            return Err(StoreError::QuotaExceeded { limit: quota });
        }

        let created = sqlx::query_as::<_, ApiKey>(&format!(
            "INSERT INTO api_keys (user_id, api_key, created_at, expires_at, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {API_KEY_COLUMNS}"
        ))
        .bind(key.user_id)
        .bind(&key.api_key)
        .bind(key.created_at)
        .bind(key.expires_at)
        .bind(&key.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(created)
    }

    async fn delete_api_key(&self, user_id: i64, key_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(key_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_projects(&self, user_id: i64) -> StoreResult<Vec<ProjectSummary>> {
        let projects = sqlx::query_as::<_, ProjectSummary>(
            "SELECT p.id, p.user_id, p.project_name, p.project_serial, p.created_at, p.remark,
                    COUNT(d.id) AS device_count
             FROM projects p
             LEFT JOIN devices d ON d.project_id = p.id
             WHERE p.user_id = $1
             GROUP BY p.id
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn find_project(&self, user_id: i64, project_id: i64) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2"
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (user_id, project_name, project_serial, created_at, remark)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(project.user_id)
        .bind(&project.project_name)
        .bind(&project.project_serial)
        .bind(project.created_at)
        .bind(&project.remark)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_project(&self, user_id: i64, project_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_devices(&self, project_id: i64) -> StoreResult<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE project_id = $1 ORDER BY id ASC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }

    async fn insert_device(&self, device: NewDevice) -> StoreResult<Device> {
        sqlx::query_as::<_, Device>(&format!(
            "INSERT INTO devices (project_id, device_mac, authorized_at, remark)
             VALUES ($1, $2, $3, $4)
             RETURNING {DEVICE_COLUMNS}"
        ))
        .bind(device.project_id)
        .bind(&device.device_mac)
        .bind(device.authorized_at)
        .bind(&device.remark)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_device(&self, project_id: i64, device_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1 AND project_id = $2")
            .bind(device_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
