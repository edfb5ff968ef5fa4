//! Adaptive scoring and scheduling engine.
//!
//! Owns the read-modify-write cycle around a user's state document: every
//! operation that may create or change the document holds that user's lock
//! from load to save, so two requests for the same user never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use gateprep_algo::mock::{MOCK_TEST_DIFFICULTY, MOCK_TEST_SUBJECT};
use gateprep_algo::{
    apply_answer, build_learning_path, grade_mock_test, initial_state, progress_report,
    recommend, validate_fraction, Catalog, DifficultyLevel, LearningPathEntry, MockError,
    MockQuestion, MockTestReport, ProgressReport, ScoringConfig, TopicKey, UpdateResult,
    UserState,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::catalog::TopicCatalog;
use crate::overview::{self, Overview};
use crate::questions::{self, QuestionBank};
use crate::store::{StateStore, StorageError, TestRecord};

pub const DEFAULT_RECOMMENDATIONS: usize = 3;
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Mock(#[from] MockError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub default_recommendations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            default_recommendations: DEFAULT_RECOMMENDATIONS,
        }
    }
}

/// Result of recording a whole practice test for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub record: TestRecord,
    pub update: UpdateResult,
}

pub struct AdaptiveEngine {
    store: Arc<dyn StateStore>,
    catalog: Arc<TopicCatalog>,
    config: EngineConfig,
    user_locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AdaptiveEngine {
    pub fn new(store: Arc<dyn StateStore>, catalog: Arc<TopicCatalog>, config: EngineConfig) -> Self {
        Self {
            store,
            catalog,
            config,
            user_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.snapshot()
    }

    async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.user_locks.lock();
            // drop locks nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Caller must hold the user's lock.
    async fn load_or_init(&self, user_id: &str) -> Result<UserState, EngineError> {
        if let Some(state) = self.store.load_state(user_id).await? {
            return Ok(state);
        }

        let catalog = self.catalog.snapshot();
        let state = initial_state(user_id, &catalog, Utc::now());
        self.store.save_state(&state).await?;
        tracing::info!(
            user_id,
            topics = state.topic_scores.len(),
            "initialized learning state"
        );
        Ok(state)
    }

    async fn persist(&self, state: &mut UserState) -> Result<(), EngineError> {
        state.touch(Utc::now());
        self.store.save_state(state).await?;
        Ok(())
    }

    pub async fn get_or_create_state(&self, user_id: &str) -> Result<UserState, EngineError> {
        let _guard = self.lock_user(user_id).await;
        self.load_or_init(user_id).await
    }

    pub async fn reset_state(&self, user_id: &str) -> Result<UserState, EngineError> {
        let _guard = self.lock_user(user_id).await;
        self.store.delete_state(user_id).await?;
        tracing::info!(user_id, "learning state reset");
        self.load_or_init(user_id).await
    }

    /// Scores one answer against the topic's subject.
    ///
    /// `topic_key` may be a bare subject or `"subject - subtopic"`; state is
    /// always tracked per subject, created on demand.
    pub async fn record_answer(
        &self,
        user_id: &str,
        topic_key: &str,
        correct_fraction: f64,
        time_taken: f64,
    ) -> Result<UpdateResult, EngineError> {
        let fraction =
            validate_fraction(correct_fraction).map_err(|e| EngineError::Validation(e.to_string()))?;

        let _guard = self.lock_user(user_id).await;
        let mut state = self.load_or_init(user_id).await?;
        let result = self.apply_to_subject(&mut state, topic_key, fraction);
        self.persist(&mut state).await?;

        tracing::info!(
            user_id,
            topic = topic_key,
            fraction,
            time_taken,
            level = %result.current_difficulty,
            difficulty_changed = result.difficulty_changed,
            "answer recorded"
        );
        Ok(result)
    }

    fn apply_to_subject(&self, state: &mut UserState, topic_key: &str, fraction: f64) -> UpdateResult {
        let subject = TopicKey::parse(topic_key).to_subject_key();
        let progress = state.topic_scores.entry_or_fresh(subject);
        apply_answer(progress, fraction, Utc::now(), &self.config.scoring)
    }

    pub async fn get_topic_recommendations(
        &self,
        user_id: &str,
        n: Option<usize>,
    ) -> Result<Vec<TopicKey>, EngineError> {
        let n = n.unwrap_or(self.config.default_recommendations);
        let state = self.get_or_create_state(user_id).await?;
        Ok(recommend(&state, n, Utc::now()))
    }

    pub async fn generate_learning_path(
        &self,
        user_id: &str,
    ) -> Result<Vec<LearningPathEntry>, EngineError> {
        let _guard = self.lock_user(user_id).await;
        let mut state = self.load_or_init(user_id).await?;

        let catalog = self.catalog.snapshot();
        let path = build_learning_path(&state, &catalog);
        state.learning_path = path.clone();
        self.persist(&mut state).await?;

        tracing::debug!(user_id, entries = path.len(), "learning path generated");
        Ok(path)
    }

    pub async fn get_progress_report(&self, user_id: &str) -> Result<ProgressReport, EngineError> {
        let state = self.get_or_create_state(user_id).await?;
        Ok(progress_report(&state, Utc::now()))
    }

    /// Feeds a practice test's score into the subject like a single answer,
    /// then stores the test at the level it was taken at.
    pub async fn record_test_result(
        &self,
        user_id: &str,
        subject: &str,
        total_correct: u32,
        num_questions: u32,
        time_taken: f64,
    ) -> Result<TestOutcome, EngineError> {
        if num_questions == 0 {
            return Err(EngineError::Validation(
                "num_questions must be greater than zero".to_string(),
            ));
        }
        if total_correct > num_questions {
            return Err(EngineError::Validation(format!(
                "total_correct ({total_correct}) exceeds num_questions ({num_questions})"
            )));
        }

        let _guard = self.lock_user(user_id).await;
        let mut state = self.load_or_init(user_id).await?;

        let subject_key = TopicKey::parse(subject).to_subject_key();
        let level = state
            .topic_scores
            .get(&subject_key)
            .map(|p| p.difficulty_level)
            .unwrap_or(DifficultyLevel::Beginner);

        let record = TestRecord::new(
            user_id,
            subject_key.subject(),
            level.as_str(),
            total_correct,
            num_questions,
            time_taken,
            Utc::now(),
        );
        let update = self.apply_to_subject(&mut state, subject, record.score);
        // history only lists tests whose score reached the state
        self.persist(&mut state).await?;
        self.store.append_test_result(&record).await?;

        tracing::info!(
            user_id,
            subject = %record.subject,
            score = record.score,
            level = %update.current_difficulty,
            difficulty_changed = update.difficulty_changed,
            "test result recorded"
        );
        Ok(TestOutcome { record, update })
    }

    pub async fn get_test_history(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<TestRecord>, EngineError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(self.store.list_test_results(user_id, subject, limit).await?)
    }

    /// Catalog subjects merged with the user's progress, the learning path
    /// and the last [`DEFAULT_HISTORY_LIMIT`] tests per subject.
    pub async fn get_overview(&self, user_id: &str) -> Result<Overview, EngineError> {
        let learning_path = self.generate_learning_path(user_id).await?;
        let state = self.get_or_create_state(user_id).await?;
        let catalog = self.catalog.snapshot();

        let mut histories: Vec<(String, Vec<TestRecord>)> = Vec::new();
        for title in catalog.subject_titles() {
            let name = overview::history_subject(title);
            if histories.iter().any(|(seen, _)| *seen == name) {
                continue;
            }
            let records = self
                .store
                .list_test_results(user_id, Some(name.as_str()), DEFAULT_HISTORY_LIMIT)
                .await?;
            histories.push((name, records));
        }

        Ok(overview::assemble(&state, &catalog, &histories, learning_path, Utc::now()))
    }

    /// Draws up to `per_subject` stored questions for every catalog subject,
    /// in catalog order.
    pub fn assemble_mock_test(&self, bank: &dyn QuestionBank, per_subject: usize) -> Vec<MockQuestion> {
        let catalog = self.catalog.snapshot();
        let mut rng = rand::rng();
        let test = questions::assemble_mock_test(bank, catalog.subject_titles(), per_subject, &mut rng);
        tracing::debug!(questions = test.len(), per_subject, "mock test assembled");
        test
    }

    /// Grades a mock test and stores it in the history. Subject state is
    /// left untouched.
    pub async fn submit_mock_test(
        &self,
        user_id: &str,
        questions: &[MockQuestion],
        answers: &[String],
    ) -> Result<MockTestReport, EngineError> {
        let report = grade_mock_test(questions, answers)?;

        let _guard = self.lock_user(user_id).await;
        let record = TestRecord::new(
            user_id,
            MOCK_TEST_SUBJECT,
            MOCK_TEST_DIFFICULTY,
            report.correct,
            report.total,
            0.0,
            Utc::now(),
        );
        self.store.append_test_result(&record).await?;

        tracing::info!(user_id, score = %report.summary(), "mock test graded");
        Ok(report)
    }
}
