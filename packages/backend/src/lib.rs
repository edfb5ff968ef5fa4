pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod overview;
pub mod questions;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

use std::sync::Arc;

use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::TopicCatalog;
use crate::config::{Config, StateBackend};
use crate::db::DbInitError;
use crate::engine::AdaptiveEngine;
use crate::questions::JsonQuestionBank;
use crate::state::AppState;
use crate::store::{FileStateStore, MemoryStateStore, SqlStateStore, StateStore, StorageError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DbInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub async fn build_store(config: &Config) -> Result<Arc<dyn StateStore>, StartupError> {
    let store: Arc<dyn StateStore> = match config.state_backend {
        StateBackend::Memory => Arc::new(MemoryStateStore::new()),
        StateBackend::File => {
            let store = FileStateStore::open(&config.state_dir).await?;
            tracing::info!(dir = %store.dir().display(), "file state store opened");
            Arc::new(store)
        }
        StateBackend::Sqlite => {
            let path = config
                .sqlite_path
                .clone()
                .unwrap_or_else(db::default_sqlite_path);
            Arc::new(SqlStateStore::sqlite(db::connect_sqlite(&path).await?))
        }
        StateBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or(DbInitError::MissingUrl)?;
            Arc::new(SqlStateStore::postgres(db::connect_postgres(url).await?))
        }
    };
    tracing::info!(backend = ?config.state_backend, "state store initialized");
    Ok(store)
}

pub async fn create_app(config: &Config) -> Result<axum::Router, StartupError> {
    let store = build_store(config).await?;
    let catalog = Arc::new(TopicCatalog::from_path(&config.catalog_path));
    let questions = Arc::new(JsonQuestionBank::from_path(&config.question_bank_path));
    let engine = Arc::new(AdaptiveEngine::new(store, Arc::clone(&catalog), config.engine));

    let state = AppState::new(engine, catalog, questions, config.mock_questions_per_subject);
    Ok(app(state))
}

pub fn app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
