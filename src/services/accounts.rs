use chrono::Duration;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth;
use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::models::user::{NewUser, User};
use crate::store::Store;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Email address
    #[validate(email)]
    #[validate(length(max = 100))]
    pub email: String,
    /// Password (at least 6 characters)
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

/// A successful login: the user and a freshly signed session token
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    settings: Settings,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Length and format rules apply to the trimmed values that get stored
    async fn prepare_user(&self, req: RegisterRequest, is_admin: bool) -> AppResult<NewUser> {
        let req = RegisterRequest {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password: req.password,
        };
        req.validate()?;

        let password_hash = auth::hash_password(req.password, self.settings.bcrypt_cost).await?;
        Ok(NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            is_admin,
        })
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<User> {
        let new_user = self.prepare_user(req, false).await?;
        let user = self.store.create_user(new_user).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Look the user up by username or email and check the password.
    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> AppResult<Session> {
        let login = req.username.trim();
        if login.is_empty() || req.password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        let user = self
            .store
            .find_user_by_login(login)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !auth::verify_password(req.password, user.password_hash.clone()).await? {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized);
        }

        let token = auth::issue_token(
            &user,
            self.settings.jwt_secret.expose_secret().as_bytes(),
            Duration::seconds(self.settings.session_ttl_seconds as i64),
        )?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(Session { user, token })
    }

    /// Reload the session user; a deleted account no longer has a session
    pub async fn current_user(&self, user_id: i64) -> AppResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    pub async fn is_setup_complete(&self) -> AppResult<bool> {
        Ok(self.store.admin_exists().await?)
    }

    /// Create the first admin account; refused once any admin exists
    pub async fn create_admin(&self, req: RegisterRequest) -> AppResult<User> {
        if self.store.admin_exists().await? {
            return Err(AppError::SetupComplete);
        }

        let new_user = self.prepare_user(req, true).await?;
        let admin = self
            .store
            .create_first_admin(new_user)
            .await?
            .ok_or(AppError::SetupComplete)?;

        tracing::info!(user_id = admin.id, username = %admin.username, "Admin user created");
        Ok(admin)
    }
}
