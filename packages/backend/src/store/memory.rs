use std::collections::HashMap;

use async_trait::async_trait;
use gateprep_algo::UserState;
use parking_lot::RwLock;

use super::{select_history, StateStore, StorageError, TestRecord};

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, UserState>>,
    history: RwLock<HashMap<String, Vec<TestRecord>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.states.read().len()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_state(&self, user_id: &str) -> Result<Option<UserState>, StorageError> {
        Ok(self.states.read().get(user_id).cloned())
    }

    async fn save_state(&self, state: &UserState) -> Result<(), StorageError> {
        self.states
            .write()
            .insert(state.user_id.clone(), state.clone());
        Ok(())
    }

    async fn delete_state(&self, user_id: &str) -> Result<(), StorageError> {
        self.states.write().remove(user_id);
        Ok(())
    }

    async fn append_test_result(&self, record: &TestRecord) -> Result<(), StorageError> {
        self.history
            .write()
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn list_test_results(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TestRecord>, StorageError> {
        let history = self.history.read();
        Ok(history
            .get(user_id)
            .map(|records| select_history(records, subject, limit))
            .unwrap_or_default())
    }
}
