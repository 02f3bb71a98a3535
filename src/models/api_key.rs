use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    pub id: i64,
    pub user_id: i64,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub note: String,
}

impl ApiKey {
    /// Expiry is never stored; it is derived from `expires_at` on every read.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub user_id: i64,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub note: String,
}

/// API key as shown to its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyResponse {
    pub id: i64,
    /// The 10-character key
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub note: String,
    /// Computed at read time from `expires_at`
    pub is_expired: bool,
}

impl ApiKeyResponse {
    pub fn at(key: ApiKey, now: DateTime<Utc>) -> Self {
        let is_expired = key.is_expired_at(now);
        Self {
            id: key.id,
            api_key: key.api_key,
            created_at: key.created_at,
            expires_at: key.expires_at,
            note: key.note,
            is_expired,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateApiKeyRequest {
    /// RFC 3339 timestamp or `YYYY-MM-DD`; defaults to seven days from now
    pub expiration: Option<String>,
    /// Optional free-form note (max 500 characters)
    #[validate(length(max = 500))]
    pub note: Option<String>,
}
