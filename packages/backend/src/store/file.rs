use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gateprep_algo::UserState;

use super::{select_history, StateStore, StorageError, TestRecord};

/// One pretty-printed JSON document per user under `dir`:
/// `user_<id>_state.json` for the learning state, `user_<id>_tests.json`
/// for test history.
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state_path(&self, user_id: &str) -> Result<PathBuf, StorageError> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("user_{user_id}_state.json")))
    }

    fn history_path(&self, user_id: &str) -> Result<PathBuf, StorageError> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("user_{user_id}_tests.json")))
    }

    async fn read_history(&self, user_id: &str) -> Result<Vec<TestRecord>, StorageError> {
        match tokio::fs::read(self.history_path(user_id)?).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

/// User ids become file names, so anything that could escape `dir` is refused.
fn validate_user_id(user_id: &str) -> Result<(), StorageError> {
    let bad = user_id.is_empty()
        || user_id == "."
        || user_id == ".."
        || user_id.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(StorageError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load_state(&self, user_id: &str) -> Result<Option<UserState>, StorageError> {
        match tokio::fs::read(self.state_path(user_id)?).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_state(&self, state: &UserState) -> Result<(), StorageError> {
        let path = self.state_path(&state.user_id)?;
        let bytes = serde_json::to_vec_pretty(state)?;
        write_atomic(&path, &bytes).await
    }

    async fn delete_state(&self, user_id: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.state_path(user_id)?).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn append_test_result(&self, record: &TestRecord) -> Result<(), StorageError> {
        let mut history = self.read_history(&record.user_id).await?;
        history.push(record.clone());
        let bytes = serde_json::to_vec_pretty(&history)?;
        write_atomic(&self.history_path(&record.user_id)?, &bytes).await
    }

    async fn list_test_results(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TestRecord>, StorageError> {
        let history = self.read_history(user_id).await?;
        Ok(select_history(&history, subject, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validation() {
        assert!(validate_user_id("user-42").is_ok());
        assert!(validate_user_id("alice@example.com").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("..").is_err());
        assert!(validate_user_id("../etc").is_err());
        assert!(validate_user_id("a\\b").is_err());
    }
}
