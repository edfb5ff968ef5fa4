mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use gateprep_algo::{initial_state, Catalog, TopicKey};
use gateprep_backend::catalog::TopicCatalog;
use gateprep_backend::db;
use gateprep_backend::engine::{AdaptiveEngine, EngineConfig};
use gateprep_backend::store::{
    FileStateStore, MemoryStateStore, SqlStateStore, StateStore, StorageError, TestRecord,
};
use tempfile::TempDir;

async fn sqlite_store(dir: &TempDir) -> SqlStateStore {
    let pool = db::connect_sqlite(&dir.path().join("nested").join("state.db"))
        .await
        .expect("sqlite pool");
    SqlStateStore::sqlite(pool)
}

async fn exercise_state_round_trip(store: &dyn StateStore) {
    let catalog = common::fixture_catalog();
    let mut state = initial_state("round-trip", &catalog, Utc::now());
    state
        .topic_scores
        .entry_or_fresh(TopicKey::subject_only("Digital Logic"))
        .attempts = 4;

    assert!(store.load_state("round-trip").await.unwrap().is_none());

    store.save_state(&state).await.unwrap();
    let loaded = store.load_state("round-trip").await.unwrap().unwrap();
    assert_eq!(loaded, state);

    // overwrite, not merge
    state.topic_scores = Default::default();
    store.save_state(&state).await.unwrap();
    let loaded = store.load_state("round-trip").await.unwrap().unwrap();
    assert!(loaded.topic_scores.is_empty());

    store.delete_state("round-trip").await.unwrap();
    assert!(store.load_state("round-trip").await.unwrap().is_none());
    store.delete_state("round-trip").await.unwrap();
}

async fn exercise_history(store: &dyn StateStore) {
    let base = Utc::now();
    for (offset, subject) in [(0, "Digital Logic"), (1, "Operating Systems"), (2, "Digital Logic")] {
        let record = TestRecord::new(
            "hist",
            subject,
            "beginner",
            offset + 1,
            5,
            60.0,
            base + Duration::minutes(offset as i64),
        );
        store.append_test_result(&record).await.unwrap();
    }
    let other = TestRecord::new("someone-else", "Digital Logic", "beginner", 1, 1, 1.0, base);
    store.append_test_result(&other).await.unwrap();

    let all = store.list_test_results("hist", None, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].correct_answers, 3);
    assert_eq!(all[2].correct_answers, 1);
    assert!((all[0].score - 0.6).abs() < 1e-12);

    let logic = store
        .list_test_results("hist", Some("Digital Logic"), 10)
        .await
        .unwrap();
    assert_eq!(logic.len(), 2);
    assert!(logic.iter().all(|r| r.subject == "Digital Logic"));

    let newest = store.list_test_results("hist", None, 1).await.unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].subject, "Digital Logic");
    assert_eq!(newest[0].id, all[0].id);

    assert!(store
        .list_test_results("nobody", None, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_memory_store() {
    let store = MemoryStateStore::new();
    exercise_state_round_trip(&store).await;
    exercise_history(&store).await;
    assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn test_file_store() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::open(dir.path().join("states")).await.unwrap();
    exercise_state_round_trip(&store).await;
    exercise_history(&store).await;

    assert!(store.dir().join("user_hist_tests.json").exists());
}

#[tokio::test]
async fn test_file_store_rejects_path_like_ids() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::open(dir.path()).await.unwrap();

    for bad in ["", "..", "a/b", "a\\b"] {
        let err = store.load_state(bad).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidUserId(_)));
    }
}

#[tokio::test]
async fn test_file_store_corrupt_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::open(dir.path()).await.unwrap();
    std::fs::write(dir.path().join("user_broken_state.json"), "{ nope").unwrap();

    let err = store.load_state("broken").await.unwrap_err();
    assert!(matches!(err, StorageError::Serde(_)));
}

#[tokio::test]
async fn test_sqlite_store() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    exercise_state_round_trip(&store).await;
    exercise_history(&store).await;
}

#[tokio::test]
async fn test_sqlite_schema_is_reapplied_safely() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    let state = initial_state("again", &common::fixture_catalog(), Utc::now());
    store.save_state(&state).await.unwrap();

    let reopened = sqlite_store(&dir).await;
    assert_eq!(reopened.load_state("again").await.unwrap(), Some(state));
}

#[tokio::test]
async fn test_engine_state_survives_restart_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(TopicCatalog::from_catalog(common::fixture_catalog()));

    {
        let store: Arc<dyn StateStore> = Arc::new(sqlite_store(&dir).await);
        let engine = AdaptiveEngine::new(store, Arc::clone(&catalog), EngineConfig::default());
        engine
            .record_answer("persist", "Digital Logic", 0.9, 1.0)
            .await
            .unwrap();
    }

    let store: Arc<dyn StateStore> = Arc::new(sqlite_store(&dir).await);
    let engine = AdaptiveEngine::new(store, catalog, EngineConfig::default());
    let state = engine.get_or_create_state("persist").await.unwrap();
    let progress = state
        .topic_scores
        .get(&TopicKey::subject_only("Digital Logic"))
        .unwrap();
    assert_eq!(progress.difficulty_level.as_str(), "intermediate");
}

#[tokio::test]
async fn test_file_store_keeps_separator_subjects_stable() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(FileStateStore::open(dir.path()).await.unwrap());
    let catalog = Catalog {
        topics: vec![common::subject("Networks - Advanced", &["TCP", "UDP"])],
    };
    let engine = common::engine_with_store(catalog, store);

    let first = engine.get_or_create_state("net").await.unwrap();
    let second = engine.get_or_create_state("net").await.unwrap();
    assert_eq!(first, second);

    engine
        .record_answer("net", "Networks - Advanced - TCP", 0.5, 1.0)
        .await
        .unwrap();
    let report = engine.get_progress_report("net").await.unwrap();
    let subjects: Vec<&str> = report.subjects.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(subjects, vec!["Networks"]);
    assert_eq!(report.subjects[0].1.total_topics, 3);
}
