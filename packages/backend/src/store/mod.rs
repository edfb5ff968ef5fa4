//! Persistence for user learning state and test history.
//!
//! The engine only sees the [`StateStore`] trait; the concrete store is chosen
//! at startup and handed in by the caller.

mod file;
mod memory;
mod sql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateprep_algo::UserState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use sql::SqlStateStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state document could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

/// One completed practice or mock test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub score: f64,
    /// Level the test was taken at, or `"mixed"` for mock tests
    pub difficulty_level: String,
    pub time_taken: f64,
    pub num_questions: u32,
    pub correct_answers: u32,
    pub test_date: DateTime<Utc>,
}

impl TestRecord {
    pub fn new(
        user_id: &str,
        subject: &str,
        difficulty_level: &str,
        correct_answers: u32,
        num_questions: u32,
        time_taken: f64,
        test_date: DateTime<Utc>,
    ) -> Self {
        let score = if num_questions == 0 {
            0.0
        } else {
            correct_answers as f64 / num_questions as f64
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            score,
            difficulty_level: difficulty_level.to_string(),
            time_taken,
            num_questions,
            correct_answers,
            test_date,
        }
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load_state(&self, user_id: &str) -> Result<Option<UserState>, StorageError>;

    /// Overwrites the whole document.
    async fn save_state(&self, state: &UserState) -> Result<(), StorageError>;

    /// Succeeds when nothing is stored.
    async fn delete_state(&self, user_id: &str) -> Result<(), StorageError>;

    async fn append_test_result(&self, record: &TestRecord) -> Result<(), StorageError>;

    /// Newest first, optionally restricted to one subject.
    async fn list_test_results(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TestRecord>, StorageError>;
}

/// Newest first, filtered and truncated. `records` is in append order;
/// equal dates keep the later append first.
pub(crate) fn select_history(
    records: &[TestRecord],
    subject: Option<&str>,
    limit: usize,
) -> Vec<TestRecord> {
    let mut selected: Vec<TestRecord> = records
        .iter()
        .rev()
        .filter(|r| subject.map_or(true, |s| r.subject == s))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.test_date.cmp(&a.test_date));
    selected.truncate(limit);
    selected
}
