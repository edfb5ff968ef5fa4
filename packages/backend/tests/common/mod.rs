#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use gateprep_algo::mock::QuestionKind;
use gateprep_algo::{Catalog, MockQuestion, Subject, Subtopic, UserState};
use gateprep_backend::catalog::TopicCatalog;
use gateprep_backend::engine::{AdaptiveEngine, EngineConfig};
use gateprep_backend::questions::JsonQuestionBank;
use gateprep_backend::state::AppState;
use gateprep_backend::store::{MemoryStateStore, StateStore, StorageError, TestRecord};
use http_body_util::BodyExt;

pub fn subtopic(title: &str) -> Subtopic {
    Subtopic {
        title: title.to_string(),
        key_points: vec![format!("{title} basics")],
        examples: vec![format!("{title} example")],
    }
}

pub fn subject(title: &str, subtopics: &[&str]) -> Subject {
    Subject {
        title: title.to_string(),
        subtopics: subtopics.iter().map(|s| subtopic(s)).collect(),
    }
}

pub fn fixture_catalog() -> Catalog {
    Catalog {
        topics: vec![
            subject("Digital Logic", &["Gates", "FSM"]),
            subject("Operating Systems", &["Scheduling", "Paging", "Deadlocks"]),
        ],
    }
}

pub fn question(subject: &str, n: usize, answer: u32) -> MockQuestion {
    MockQuestion {
        question: format!("{subject} question {n}"),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: serde_json::json!(answer),
        explanation: String::new(),
        subject: subject.to_string(),
        kind: QuestionKind::SingleAnswer,
    }
}

pub fn fixture_questions() -> Vec<MockQuestion> {
    let mut questions: Vec<MockQuestion> = (0..4).map(|n| question("Digital Logic", n, 1)).collect();
    questions.extend((0..4).map(|n| question("Operating Systems", n, 2)));
    questions
}

pub fn create_engine(catalog: Catalog) -> (Arc<AdaptiveEngine>, Arc<dyn StateStore>) {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    (engine_with_store(catalog, Arc::clone(&store)), store)
}

pub fn engine_with_store(catalog: Catalog, store: Arc<dyn StateStore>) -> Arc<AdaptiveEngine> {
    let catalog = Arc::new(TopicCatalog::from_catalog(catalog));
    Arc::new(AdaptiveEngine::new(store, catalog, EngineConfig::default()))
}

// ==================== Store wrappers ====================

/// Sleeps after every load, so unserialized read-modify-write cycles on a
/// multi-threaded runtime overlap and lose updates.
#[derive(Default)]
pub struct SlowLoadStore {
    inner: MemoryStateStore,
}

#[async_trait]
impl StateStore for SlowLoadStore {
    async fn load_state(&self, user_id: &str) -> Result<Option<UserState>, StorageError> {
        let state = self.inner.load_state(user_id).await?;
        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok(state)
    }

    async fn save_state(&self, state: &UserState) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.inner.save_state(state).await
    }

    async fn delete_state(&self, user_id: &str) -> Result<(), StorageError> {
        self.inner.delete_state(user_id).await
    }

    async fn append_test_result(&self, record: &TestRecord) -> Result<(), StorageError> {
        self.inner.append_test_result(record).await
    }

    async fn list_test_results(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TestRecord>, StorageError> {
        self.inner.list_test_results(user_id, subject, limit).await
    }
}

/// Memory store whose saves start failing once `fail_saves` is set.
#[derive(Default)]
pub struct FailingSaveStore {
    inner: MemoryStateStore,
    pub fail_saves: AtomicBool,
}

#[async_trait]
impl StateStore for FailingSaveStore {
    async fn load_state(&self, user_id: &str) -> Result<Option<UserState>, StorageError> {
        self.inner.load_state(user_id).await
    }

    async fn save_state(&self, state: &UserState) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save_state(state).await
    }

    async fn delete_state(&self, user_id: &str) -> Result<(), StorageError> {
        self.inner.delete_state(user_id).await
    }

    async fn append_test_result(&self, record: &TestRecord) -> Result<(), StorageError> {
        self.inner.append_test_result(record).await
    }

    async fn list_test_results(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TestRecord>, StorageError> {
        self.inner.list_test_results(user_id, subject, limit).await
    }
}

pub fn create_test_app() -> axum::Router {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let catalog = Arc::new(TopicCatalog::from_catalog(fixture_catalog()));
    let engine = Arc::new(AdaptiveEngine::new(
        store,
        Arc::clone(&catalog),
        EngineConfig::default(),
    ));
    let questions = Arc::new(JsonQuestionBank::new(fixture_questions()));
    gateprep_backend::app(AppState::new(engine, catalog, questions, 2))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
