//! Progress Report
//!
//! Aggregates topic entries by subject. Subtopic-seeded entries and
//! subject-level entries created by answers are folded into the same subject.

use chrono::{DateTime, Utc};

use crate::types::{ProgressReport, SubjectProgress, UserState};

pub fn progress_report(state: &UserState, now: DateTime<Utc>) -> ProgressReport {
    let mut subjects: Vec<(String, SubjectProgress)> = Vec::new();

    for (key, stats) in state.topic_scores.iter() {
        let subject = key.subject();
        let idx = match subjects.iter().position(|(name, _)| name == subject) {
            Some(idx) => idx,
            None => {
                subjects.push((subject.to_string(), SubjectProgress::default()));
                subjects.len() - 1
            }
        };
        let agg = &mut subjects[idx].1;

        agg.total_topics += 1;
        if stats.score > 0.0 {
            agg.topics_completed += 1;
            agg.score = agg.score.max(stats.score);
        }

        // never downgrades
        if stats.difficulty_level.rank() > agg.difficulty_level.rank() {
            agg.difficulty_level = stats.difficulty_level;
        }
    }

    ProgressReport {
        user_id: state.user_id.clone(),
        subjects,
        timestamp: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DifficultyLevel, TopicKey};

    #[test]
    fn test_mixed_granularity_folds_into_subject() {
        let now = Utc::now();
        let mut state = UserState::empty("u", now);
        for key in ["Math - Algebra", "Math - Calculus", "Math", "OS - Paging"] {
            state.topic_scores.entry_or_fresh(TopicKey::parse(key));
        }
        {
            let math = state.topic_scores.get_mut(&TopicKey::parse("Math")).unwrap();
            math.score = 0.45;
            math.difficulty_level = DifficultyLevel::Intermediate;
        }
        {
            let calc = state
                .topic_scores
                .get_mut(&TopicKey::parse("Math - Calculus"))
                .unwrap();
            calc.score = 0.2;
        }

        let report = progress_report(&state, now);
        assert_eq!(report.subjects.len(), 2);
        assert_eq!(report.subjects[0].0, "Math");

        let math = report.subject("Math").unwrap();
        assert_eq!(math.total_topics, 3);
        assert_eq!(math.topics_completed, 2);
        assert_eq!(math.score, 0.45);
        assert_eq!(math.difficulty_level, DifficultyLevel::Intermediate);

        let os = report.subject("OS").unwrap();
        assert_eq!(os.total_topics, 1);
        assert_eq!(os.topics_completed, 0);
        assert_eq!(os.difficulty_level, DifficultyLevel::Beginner);
    }

    #[test]
    fn test_seeded_subject_with_separator_groups_on_first_segment() {
        use crate::catalog::{Catalog, Subject, Subtopic};
        use crate::scoring::initial_state;

        let sub = |title: &str| Subtopic {
            title: title.to_string(),
            key_points: vec![],
            examples: vec![],
        };
        let catalog = Catalog {
            topics: vec![Subject {
                title: "Networks - Advanced".to_string(),
                subtopics: vec![sub("TCP"), sub("UDP")],
            }],
        };
        let now = Utc::now();
        let mut state = initial_state("u", &catalog, now);
        state
            .topic_scores
            .entry_or_fresh(TopicKey::parse("Networks - Advanced - TCP").to_subject_key())
            .score = 0.5;

        let report = progress_report(&state, now);
        assert_eq!(report.subjects.len(), 1);
        let networks = report.subject("Networks").unwrap();
        assert_eq!(networks.total_topics, 3);
        assert_eq!(networks.topics_completed, 1);

        // a stored copy groups the same way
        let json = serde_json::to_string(&state).unwrap();
        let restored: UserState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(progress_report(&restored, now).subjects, report.subjects);
    }

    #[test]
    fn test_difficulty_escalates_to_highest_seen() {
        let now = Utc::now();
        let mut state = UserState::empty("u", now);
        let levels = [
            DifficultyLevel::Advanced,
            DifficultyLevel::Beginner,
            DifficultyLevel::Intermediate,
        ];
        for (i, level) in levels.iter().enumerate() {
            let p = state
                .topic_scores
                .entry_or_fresh(TopicKey::subtopic("Networks", format!("t{i}")));
            p.difficulty_level = *level;
        }
        let report = progress_report(&state, now);
        assert_eq!(
            report.subject("Networks").unwrap().difficulty_level,
            DifficultyLevel::Advanced
        );
    }

    #[test]
    fn test_report_serializes_subjects_as_object() {
        let now = Utc::now();
        let mut state = UserState::empty("u", now);
        state.topic_scores.entry_or_fresh(TopicKey::parse("Zeta - a"));
        state.topic_scores.entry_or_fresh(TopicKey::parse("Alpha - b"));
        let value = serde_json::to_value(progress_report(&state, now)).unwrap();
        assert!(value["subjects"]["Zeta"]["total_topics"].is_number());
        let text = value.to_string();
        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());
    }
}
