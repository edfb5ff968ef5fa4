//! # gateprep-algo - adaptive exam-preparation algorithms
//!
//! Pure, I/O-free building blocks of the adaptive learning engine:
//!
//! - [`catalog`] - subjects, subtopics and key learning points
//! - [`scoring`] - EMA topic score and the difficulty state machine
//! - [`recommend`] - priority-ranked topic recommendations
//! - [`path`] - bounded per-subject learning path
//! - [`progress`] - per-subject progress aggregation
//! - [`mock`] - mock test grading
//! - [`types`] - shared types and constants
//!
//! Every function that depends on the clock takes `now` explicitly.
//!
//! ```rust
//! use chrono::Utc;
//! use gateprep_algo::{apply_answer, ScoringConfig, TopicProgress, DifficultyLevel};
//!
//! let mut progress = TopicProgress::fresh();
//! let result = apply_answer(&mut progress, 0.8, Utc::now(), &ScoringConfig::default());
//! assert!(result.difficulty_changed);
//! assert_eq!(progress.difficulty_level, DifficultyLevel::Intermediate);
//! ```

pub mod catalog;
pub mod mock;
pub mod path;
pub mod progress;
pub mod recommend;
pub mod scoring;
pub mod types;

pub use catalog::{Catalog, Subject, Subtopic};
pub use mock::{grade_mock_test, MockError, MockQuestion, MockTestReport};
pub use path::build_learning_path;
pub use progress::progress_report;
pub use recommend::recommend;
pub use scoring::{apply_answer, initial_state, validate_fraction, ScoringConfig, ScoringError};
pub use types::*;
