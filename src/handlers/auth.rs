use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MessageResponse;
use crate::auth::{self, AuthUser};
use crate::error::{AppError, AppResult};
use crate::models::user::UserResponse;
use crate::services::accounts::{LoginRequest, RegisterRequest};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    state.accounts.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Registration successful")),
    ))
}

/// Log in with username or email; sets the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    let session = state.accounts.login(req).await?;
    let jar = jar.add(auth::session_cookie(session.token, &state.config));

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: UserResponse::from(&session.user),
        }),
    ))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse)
    )
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(auth::expired_session_cookie());
    (jar, Json(LogoutResponse { success: true }))
}

/// Current session user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Session user", body = MeResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn me(State(state): State<AppState>, session: AuthUser) -> AppResult<Json<MeResponse>> {
    let user = state.accounts.current_user(session.user_id).await?;
    Ok(Json(MeResponse {
        user: UserResponse::from(&user),
    }))
}
