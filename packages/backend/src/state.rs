use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::catalog::TopicCatalog;
use crate::engine::AdaptiveEngine;
use crate::questions::QuestionBank;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    engine: Arc<AdaptiveEngine>,
    catalog: Arc<TopicCatalog>,
    questions: Arc<dyn QuestionBank>,
    mock_questions_per_subject: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<AdaptiveEngine>,
        catalog: Arc<TopicCatalog>,
        questions: Arc<dyn QuestionBank>,
        mock_questions_per_subject: usize,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            engine,
            catalog,
            questions,
            mock_questions_per_subject,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn engine(&self) -> Arc<AdaptiveEngine> {
        Arc::clone(&self.engine)
    }

    pub fn catalog(&self) -> Arc<TopicCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn questions(&self) -> Arc<dyn QuestionBank> {
        Arc::clone(&self.questions)
    }

    pub fn mock_questions_per_subject(&self) -> usize {
        self.mock_questions_per_subject
    }
}
