use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::net::SocketAddr;
use url::Url;
use validator::Validate;

/// What a scoped delete reports when it removed nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Idempotent: success whether or not a row was removed
    #[default]
    AlwaysSucceed,
    /// `NotFound` when zero rows were removed
    ReportMissing,
}

/// Application settings, read from environment variables (optionally via `.env`)
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Settings {
    #[serde(default = "default_listen_address")]
    #[validate(custom = "validate_socket_addr")]
    pub listen_address: String,

    /// Required unless the server runs on the in-memory store
    #[serde(default)]
    pub database_url: Option<Secret<String>>,
    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1, max = 500))]
    pub database_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub database_min_connections: u32,

    pub jwt_secret: Secret<String>,
    #[serde(default = "default_session_ttl")]
    #[validate(range(min = 300, max = 31536000))] // 5 minutes to one year
    pub session_ttl_seconds: u64,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_bcrypt_cost")]
    #[validate(range(min = 10, max = 31))]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub delete_policy: DeletePolicy,
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_session_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build settings from an explicit set of `NAME=value` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let settings: Settings =
            envy::from_iter(vars).context("Failed to read configuration from environment")?;
        settings.validate_all()?;
        Ok(settings)
    }

    pub fn validate_all(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed")?;

        if self.jwt_secret.expose_secret().len() < 16 {
            bail!("JWT_SECRET must be at least 16 characters");
        }
        if self.database_min_connections > self.database_max_connections {
            bail!("DATABASE_MIN_CONNECTIONS exceeds DATABASE_MAX_CONNECTIONS");
        }
        if let Some(url) = &self.database_url {
            validate_database_url(url.expose_secret())?;
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_ref()
            .map(|url| url.expose_secret().as_str())
            .context("DATABASE_URL environment variable is required")
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_address
            .parse()
            .context("Invalid LISTEN_ADDRESS format. Expected format: 'host:port'")
    }
}

fn validate_socket_addr(addr: &str) -> Result<(), validator::ValidationError> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("invalid_socket_address"))
}

fn validate_database_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).context("Invalid DATABASE_URL format")?;
    match url.scheme() {
        "postgres" | "postgresql" => {}
        other => bail!("Unsupported DATABASE_URL scheme '{}'", other),
    }
    if url.host_str().is_none() {
        bail!("No host found in DATABASE_URL");
    }
    Ok(())
}
