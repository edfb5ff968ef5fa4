use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use gateprep_algo::Catalog;
use serde::Serialize;

use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_catalog))
        .route("/reload", post(reload_catalog))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReloadResponse {
    subject_count: usize,
    subjects: Vec<String>,
}

async fn get_catalog(State(state): State<AppState>) -> Result<Json<SuccessResponse<Catalog>>, AppError> {
    let catalog = state.catalog().snapshot();
    Ok(ok(Catalog::clone(&catalog)))
}

async fn reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ReloadResponse>>, AppError> {
    let catalog = state.catalog().reload();
    Ok(ok(ReloadResponse {
        subject_count: catalog.subject_count(),
        subjects: catalog.subject_titles().map(str::to_string).collect(),
    }))
}
