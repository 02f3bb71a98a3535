use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{IdQuery, MessageResponse};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::api_key::{ApiKeyResponse, CreateApiKeyRequest};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyList {
    pub api_keys: Vec<ApiKeyResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCreated {
    pub success: bool,
    pub message: String,
    pub api_key: ApiKeyResponse,
}

#[utoipa::path(
    get,
    path = "/api/api-keys",
    tag = "api-keys",
    responses(
        (status = 200, description = "Keys of the session user, newest first", body = ApiKeyList),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiKeyList>> {
    let api_keys = state.api_keys.list_keys(user.user_id).await?;
    Ok(Json(ApiKeyList { api_keys }))
}

/// Issue a key. A request without a JSON body counts as `{}`; without an
/// expiration the key lives seven days.
#[utoipa::path(
    post,
    path = "/api/api-keys",
    tag = "api-keys",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "Key created", body = ApiKeyCreated),
        (status = 400, description = "Invalid expiration or quota exceeded"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateApiKeyRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    req.validate()?;

    let api_key = state
        .api_keys
        .create_key(user.user_id, req.expiration.as_deref(), req.note)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyCreated {
            success: true,
            message: "API key created".to_string(),
            api_key,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/api-keys",
    tag = "api-keys",
    params(IdQuery),
    responses(
        (status = 200, description = "Key deleted", body = MessageResponse),
        (status = 400, description = "Missing id"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No such key (report_missing policy only)")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<IdQuery>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    let key_id = query.require()?;
    state.api_keys.delete_key(user.user_id, key_id).await?;
    Ok(Json(MessageResponse::ok("API key deleted")))
}
