use axum::{routing::get, Router};
use crate::handlers::{devices, projects};
use crate::AppState;

pub fn project_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(projects::list)
                .post(projects::create)
                .delete(projects::delete),
        )
        .route(
            "/:project_id/devices",
            get(devices::list).post(devices::add).delete(devices::remove),
        )
}
