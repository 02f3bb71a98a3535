use anyhow::Context;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::AppError;
use crate::models::user::User;
use crate::AppState;

/// Cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "auth-token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize, // expiration time
}

/// Identity resolved from a verified session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

pub fn issue_token(user: &User, secret: &[u8], ttl: Duration) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .context("Failed to create session token")
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<AuthUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token verification error: {:?}", e);
        AppError::Unauthorized
    })?;

    let claims = token_data.claims;
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        username: claims.username,
        email: claims.email,
        is_admin: claims.is_admin,
    })
}

/// Hash a password with bcrypt on the blocking pool
pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

pub async fn verify_password(password: String, password_hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .context("Password verification task failed")?
        .context("Failed to parse password hash")
}

pub fn session_cookie(token: String, settings: &Settings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.cookie_secure)
        .path("/")
        .max_age(time::Duration::seconds(settings.session_ttl_seconds as i64))
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Session token from the `auth-token` cookie, falling back to a Bearer header
async fn extract_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
        .await
        .ok()
        .map(|TypedHeader(auth)| auth.token().to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts, state)
            .await
            .ok_or(AppError::Unauthorized)?;

        verify_token(&token, state.config.jwt_secret.expose_secret().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-0123456789";

    fn user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            is_admin: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip_carries_identity() {
        let token = issue_token(&user(), SECRET, Duration::hours(1)).unwrap();
        let identity = verify_token(&token, SECRET).unwrap();

        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, "alice@example.com");
        assert!(identity.is_admin);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let token = issue_token(&user(), b"another-secret-0123456789", Duration::hours(1)).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&user(), SECRET, Duration::hours(-2)).unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[tokio::test]
    async fn test_password_hash_verifies() {
        let hash = hash_password("s3cret-pass".to_string(), 10).await.unwrap();
        assert!(verify_password("s3cret-pass".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
