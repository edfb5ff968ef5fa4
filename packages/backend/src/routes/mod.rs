mod catalog;
mod health;
mod learning;
mod mock;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let users = learning::router().route("/:user_id/mock-test", post(mock::submit));

    Router::new()
        .nest("/health", health::router())
        .nest("/api/users", users)
        .nest("/api/catalog", catalog::router())
        .route("/api/mock-test", get(mock::assemble))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    AppError::not_found("route not found").into_response()
}
