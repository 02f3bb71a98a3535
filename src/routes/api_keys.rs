use axum::{routing::get, Router};
use crate::handlers::api_keys;
use crate::AppState;

pub fn api_key_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(api_keys::list)
            .post(api_keys::create)
            .delete(api_keys::delete),
    )
}
