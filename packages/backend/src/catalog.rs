use std::path::{Path, PathBuf};
use std::sync::Arc;

use gateprep_algo::Catalog;
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-mostly topic catalog.
///
/// Loading never fails the caller: any error is logged and the catalog
/// becomes empty. `reload` may be called repeatedly to pick up file changes.
pub struct TopicCatalog {
    source: Option<PathBuf>,
    current: RwLock<Arc<Catalog>>,
}

impl TopicCatalog {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let catalog = Self {
            source: Some(path.into()),
            current: RwLock::new(Arc::new(Catalog::empty())),
        };
        catalog.reload();
        catalog
    }

    /// Fixed catalog with no backing file; `reload` keeps it as is.
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn try_load(path: &Path) -> Result<Catalog, CatalogLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CatalogLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn reload(&self) -> Arc<Catalog> {
        let Some(path) = self.source.as_deref() else {
            return self.snapshot();
        };

        let catalog = match Self::try_load(path) {
            Ok(catalog) => {
                let subjects: Vec<&str> = catalog.subject_titles().collect();
                tracing::info!(path = %path.display(), ?subjects, "topic catalog loaded");
                catalog
            }
            Err(err) => {
                tracing::warn!(error = %err, "topic catalog unavailable, using empty catalog");
                Catalog::empty()
            }
        };

        let catalog = Arc::new(catalog);
        *self.current.write() = Arc::clone(&catalog);
        catalog
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let catalog = TopicCatalog::from_path("/definitely/not/here/topics.json");
        assert!(catalog.snapshot().is_empty());
    }

    #[test]
    fn test_malformed_file_degrades_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let catalog = TopicCatalog::from_path(file.path());
        assert!(catalog.snapshot().is_empty());
        assert!(matches!(
            TopicCatalog::try_load(file.path()),
            Err(CatalogLoadError::Parse { .. })
        ));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.json");
        std::fs::write(&path, r#"{"topics":[{"title":"Math","subtopics":[]}]}"#).unwrap();

        let catalog = TopicCatalog::from_path(&path);
        assert_eq!(catalog.snapshot().subject_count(), 1);

        std::fs::write(
            &path,
            r#"{"topics":[{"title":"Math","subtopics":[]},{"title":"OS","subtopics":[]}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.reload().subject_count(), 2);
        assert_eq!(catalog.reload().subject_count(), 2);
    }
}
