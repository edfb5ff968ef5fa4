//! Learning Path Assembly
//!
//! One entry per catalog subject: the lowest-scoring unmastered subtopic at the
//! lowest level that still has one. The path is then ordered by level, higher
//! score first within a level, and cut to `MAX_PATH_LEN`.

use crate::catalog::{Catalog, Subtopic};
use crate::types::{
    DifficultyLevel, LearningPathEntry, TopicKey, TopicProgress, UserState, MAX_PATH_LEN,
};

pub fn build_learning_path(state: &UserState, catalog: &Catalog) -> Vec<LearningPathEntry> {
    let fresh = TopicProgress::fresh();
    let mut path = Vec::new();

    for subject in &catalog.topics {
        let candidates: Vec<(TopicKey, &TopicProgress, &Subtopic)> = subject
            .subtopics
            .iter()
            .map(|sub| {
                let key = TopicKey::subtopic(subject.title.as_str(), sub.title.as_str());
                let stats = state.topic_scores.get(&key).unwrap_or(&fresh);
                (key, stats, sub)
            })
            .collect();

        if let Some(entry) = pick_for_subject(&candidates) {
            path.push(entry);
        }
    }

    // stable: equal keys keep catalog order
    path.sort_by(|a: &LearningPathEntry, b: &LearningPathEntry| {
        a.difficulty_level
            .rank()
            .cmp(&b.difficulty_level.rank())
            .then_with(|| b.current_score.total_cmp(&a.current_score))
    });
    path.truncate(MAX_PATH_LEN);
    path
}

fn pick_for_subject(
    candidates: &[(TopicKey, &TopicProgress, &Subtopic)],
) -> Option<LearningPathEntry> {
    for level in DifficultyLevel::ALL {
        let mut lowest: Option<&(TopicKey, &TopicProgress, &Subtopic)> = None;
        for candidate in candidates
            .iter()
            .filter(|(_, stats, _)| stats.difficulty_level == level && !stats.mastered)
        {
            // strict less-than keeps the first encountered on ties
            if lowest.map_or(true, |best| candidate.1.score < best.1.score) {
                lowest = Some(candidate);
            }
        }

        if let Some((key, stats, sub)) = lowest {
            return Some(LearningPathEntry {
                topic: key.to_string(),
                key_points: sub.key_points.clone(),
                examples: sub.examples.clone(),
                current_score: stats.score,
                difficulty_level: stats.difficulty_level,
                attempts: stats.attempts,
            });
        }
    }
    None
}
