//! Dashboard overview: every catalog subject with its progress, subtopics
//! and recent test attempts.

use chrono::{DateTime, Utc};
use gateprep_algo::{
    progress_report, Catalog, DifficultyLevel, LearningPathEntry, TopicKey, UserState,
};
use serde::Serialize;

use crate::store::TestRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub user_id: String,
    pub subjects: Vec<SubjectOverview>,
    pub learning_path: Vec<LearningPathEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectOverview {
    pub subject: String,
    pub difficulty_level: DifficultyLevel,
    pub score: f64,
    pub mastered: bool,
    pub last_attempt: Option<DateTime<Utc>>,
    pub topics_completed: u32,
    pub subtopics: Vec<SubtopicOverview>,
    pub history: Vec<AttemptSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtopicOverview {
    pub title: String,
    pub score: f64,
    pub difficulty_level: DifficultyLevel,
    pub mastered: bool,
}

/// One test as shown on the dashboard. `attempt_number` counts from 1 for
/// the newest shown record; `score` is a percentage with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub attempt_number: usize,
    pub score: f64,
    pub date: DateTime<Utc>,
    pub difficulty_level: String,
}

impl AttemptSummary {
    fn from_record(index: usize, record: &TestRecord) -> Self {
        Self {
            attempt_number: index + 1,
            score: (record.score * 1000.0).round() / 10.0,
            date: record.test_date,
            difficulty_level: record.difficulty_level.clone(),
        }
    }
}

/// Subject name that state entries and test records use for a catalog title.
pub fn history_subject(title: &str) -> String {
    TopicKey::subject_only(title).subject().to_string()
}

/// Builds the overview in catalog order. `histories` holds the newest-first
/// records per [`history_subject`] name; subjects without one get an empty
/// history.
pub fn assemble(
    state: &UserState,
    catalog: &Catalog,
    histories: &[(String, Vec<TestRecord>)],
    learning_path: Vec<LearningPathEntry>,
    now: DateTime<Utc>,
) -> Overview {
    let report = progress_report(state, now);

    let subjects = catalog
        .topics
        .iter()
        .map(|subject| {
            let name = history_subject(&subject.title);
            let aggregate = report.subject(&name).cloned().unwrap_or_default();
            let own = state.topic_scores.get(&TopicKey::subject_only(name.as_str()));

            let subtopics = subject
                .subtopics
                .iter()
                .map(|sub| {
                    let key = TopicKey::subtopic(subject.title.as_str(), sub.title.as_str());
                    let stats = state.topic_scores.get(&key);
                    SubtopicOverview {
                        title: sub.title.clone(),
                        score: stats.map_or(0.0, |p| p.score),
                        difficulty_level: stats.map_or(DifficultyLevel::Beginner, |p| p.difficulty_level),
                        mastered: stats.is_some_and(|p| p.mastered),
                    }
                })
                .collect();

            let history = histories
                .iter()
                .find(|(subject, _)| *subject == name)
                .map(|(_, records)| {
                    records
                        .iter()
                        .enumerate()
                        .map(|(i, r)| AttemptSummary::from_record(i, r))
                        .collect()
                })
                .unwrap_or_default();

            SubjectOverview {
                subject: subject.title.clone(),
                difficulty_level: aggregate.difficulty_level,
                score: aggregate.score,
                mastered: own.is_some_and(|p| p.mastered),
                last_attempt: own.and_then(|p| p.last_attempt),
                topics_completed: aggregate.topics_completed,
                subtopics,
                history,
            }
        })
        .collect();

    Overview {
        user_id: state.user_id.clone(),
        subjects,
        learning_path,
    }
}
