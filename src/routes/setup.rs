use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::setup;
use crate::AppState;

pub fn setup_router() -> Router<AppState> {
    Router::new()
        .route("/check", get(setup::check))
        .route("/create-admin", post(setup::create_admin))
}
