//! Domain managers. Each one owns a handle to the injected `Store` and
//! enforces the rules of its resource; HTTP handlers stay thin.

pub mod accounts;
pub mod api_keys;
pub mod devices;
pub mod projects;

pub use accounts::AccountService;
pub use api_keys::ApiKeyManager;
pub use devices::DeviceManager;
pub use projects::ProjectManager;

use crate::config::DeletePolicy;
use crate::error::{AppError, AppResult};

/// Bounded retries when a freshly generated identifier hits a unique constraint
pub(crate) const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Turn the row count of a scoped delete into the configured outcome
pub(crate) fn apply_delete_policy(
    policy: DeletePolicy,
    removed: u64,
    resource: &str,
) -> AppResult<()> {
    match policy {
        DeletePolicy::ReportMissing if removed == 0 => Err(AppError::not_found(resource)),
        _ => Ok(()),
    }
}
