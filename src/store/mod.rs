use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    api_key::{ApiKey, NewApiKey},
    device::{Device, NewDevice},
    project::{NewProject, Project, ProjectSummary},
    user::{NewUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Uniqueness rule that rejected a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Username or email already registered
    Account,
    /// API key token already issued
    ApiKeyToken,
    /// Owner already has a project with this name
    ProjectName,
    /// Project serial already assigned
    ProjectSerial,
    /// MAC already authorized in this project
    DeviceMac,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists ({0:?})")]
    AlreadyExists(Conflict),
    #[error("at most {limit} active keys allowed")]
    QuotaExceeded { limit: i64 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential store backend. Every method is a single atomic unit of work;
/// uniqueness and the key quota are enforced inside the store, never by a
/// caller-side pre-check.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Insert a user; `AlreadyExists(Account)` on username/email collision
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Look a user up by username or email
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;

    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>>;

    async fn admin_exists(&self) -> StoreResult<bool>;

    /// Insert an admin only while no admin exists; `Ok(None)` otherwise
    async fn create_first_admin(&self, user: NewUser) -> StoreResult<Option<User>>;

    /// All keys of one user, newest first
    async fn list_api_keys(&self, user_id: i64) -> StoreResult<Vec<ApiKey>>;

    /// Count the owner's keys with `expires_at > now` and insert the new key
    /// only if that count is below `quota`, atomically with respect to other
    /// inserts for the same owner.
    async fn insert_api_key_within_quota(
        &self,
        key: NewApiKey,
        quota: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<ApiKey>;

    /// Returns the number of rows removed
    async fn delete_api_key(&self, user_id: i64, key_id: i64) -> StoreResult<u64>;

    /// Projects of one user with device counts, newest first
    async fn list_projects(&self, user_id: i64) -> StoreResult<Vec<ProjectSummary>>;

    async fn find_project(&self, user_id: i64, project_id: i64) -> StoreResult<Option<Project>>;

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;

    /// Removes the project and, by cascade, its devices
    async fn delete_project(&self, user_id: i64, project_id: i64) -> StoreResult<u64>;

    /// Devices of one project in insertion order
    async fn list_devices(&self, project_id: i64) -> StoreResult<Vec<Device>>;

    async fn insert_device(&self, device: NewDevice) -> StoreResult<Device>;

    async fn delete_device(&self, project_id: i64, device_id: i64) -> StoreResult<u64>;

    async fn health_check(&self) -> StoreResult<()>;
}
