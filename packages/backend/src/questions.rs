//! Stored question bank used to assemble mock tests.

use std::path::{Path, PathBuf};

use gateprep_algo::MockQuestion;
use rand::seq::IndexedRandom;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestionBankLoadError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse question bank {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait QuestionBank: Send + Sync {
    fn questions_for(&self, subject: &str) -> Vec<MockQuestion>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Questions loaded once from a JSON array on disk.
#[derive(Debug, Clone, Default)]
pub struct JsonQuestionBank {
    questions: Vec<MockQuestion>,
}

impl JsonQuestionBank {
    pub fn new(questions: Vec<MockQuestion>) -> Self {
        Self { questions }
    }

    /// Empty bank when the file is missing or malformed.
    pub fn from_path(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(questions) => {
                tracing::info!(path = %path.display(), count = questions.len(), "question bank loaded");
                Self { questions }
            }
            Err(err) => {
                tracing::warn!(error = %err, "question bank unavailable");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Vec<MockQuestion>, QuestionBankLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| QuestionBankLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| QuestionBankLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl QuestionBank for JsonQuestionBank {
    fn questions_for(&self, subject: &str) -> Vec<MockQuestion> {
        self.questions
            .iter()
            .filter(|q| q.subject == subject)
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.questions.len()
    }
}

/// Up to `count` distinct questions for `subject`, in random order.
pub fn sample_questions<R: Rng + ?Sized>(
    bank: &dyn QuestionBank,
    subject: &str,
    count: usize,
    rng: &mut R,
) -> Vec<MockQuestion> {
    let available = bank.questions_for(subject);
    if available.is_empty() {
        tracing::debug!(subject, "no stored questions for subject");
        return Vec::new();
    }
    available
        .choose_multiple(rng, count.min(available.len()))
        .cloned()
        .collect()
}

/// Per-subject samples concatenated in `subjects` order.
pub fn assemble_mock_test<'a, R: Rng + ?Sized>(
    bank: &dyn QuestionBank,
    subjects: impl IntoIterator<Item = &'a str>,
    per_subject: usize,
    rng: &mut R,
) -> Vec<MockQuestion> {
    subjects
        .into_iter()
        .flat_map(|subject| sample_questions(bank, subject, per_subject, &mut *rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateprep_algo::mock::QuestionKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(subject: &str, n: usize) -> MockQuestion {
        MockQuestion {
            question: format!("{subject} question {n}"),
            options: vec!["A".into(), "B".into()],
            correct_answer: serde_json::json!(0),
            explanation: String::new(),
            subject: subject.to_string(),
            kind: QuestionKind::SingleAnswer,
        }
    }

    fn bank() -> JsonQuestionBank {
        let mut questions: Vec<MockQuestion> = (0..6).map(|n| question("Math", n)).collect();
        questions.extend((0..2).map(|n| question("Networks", n)));
        JsonQuestionBank::new(questions)
    }

    #[test]
    fn test_sample_is_distinct_and_bounded() {
        let bank = bank();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = sample_questions(&bank, "Math", 4, &mut rng);
        assert_eq!(picked.len(), 4);
        let mut texts: Vec<&str> = picked.iter().map(|q| q.question.as_str()).collect();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), 4);

        assert_eq!(sample_questions(&bank, "Networks", 10, &mut rng).len(), 2);
        assert!(sample_questions(&bank, "Biology", 3, &mut rng).is_empty());
    }

    #[test]
    fn test_mock_test_keeps_subject_order() {
        let bank = bank();
        let mut rng = StdRng::seed_from_u64(11);
        let test = assemble_mock_test(&bank, ["Networks", "Math"], 2, &mut rng);

        let subjects: Vec<&str> = test.iter().map(|q| q.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Networks", "Networks", "Math", "Math"]);
    }

    #[test]
    fn test_missing_bank_file_is_empty() {
        let path = Path::new("/no/such/questions.json");
        assert!(matches!(
            JsonQuestionBank::try_load(path),
            Err(QuestionBankLoadError::Io { .. })
        ));
        assert!(JsonQuestionBank::from_path(path).is_empty());
    }

    #[test]
    fn test_malformed_bank_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, r#"[{"question": "no options"}"#).unwrap();

        let err = JsonQuestionBank::try_load(&path).unwrap_err();
        assert!(matches!(err, QuestionBankLoadError::Parse { .. }));
        assert!(err.to_string().contains("questions.json"));
        assert!(JsonQuestionBank::from_path(&path).is_empty());
    }
}
