use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Device {
    pub id: i64,
    pub project_id: i64,
    /// Normalized `XX:XX:XX:XX:XX:XX`, uppercase
    pub device_mac: String,
    pub authorized_at: DateTime<Utc>,
    pub remark: String,
}

#[derive(Debug, Clone)]
pub struct NewDevice {
    pub project_id: i64,
    pub device_mac: String,
    pub authorized_at: DateTime<Utc>,
    pub remark: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddDeviceRequest {
    /// Six hex pairs separated by `:` or `-`
    pub device_mac: String,
    /// Optional remark (max 500 characters)
    #[validate(length(max = 500))]
    pub remark: Option<String>,
}
