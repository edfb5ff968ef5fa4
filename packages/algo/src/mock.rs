//! Mock Test Grading
//!
//! Grades a submitted mock test against the questions that were served.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MOCK_TEST_SUBJECT: &str = "Mock Test";
pub const MOCK_TEST_DIFFICULTY: &str = "mixed";

const EXCELLENT_PERCENT: f64 = 70.0;
const GOOD_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MockError {
    #[error("invalid submission: expected {expected} answers, got {actual}")]
    InvalidSubmission { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    SingleAnswer,
    Numerical,
    DiagramQuestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// Option index or literal value; compared by its string form
    pub correct_answer: serde_json::Value,
    #[serde(default)]
    pub explanation: String,
    pub subject: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
}

impl MockQuestion {
    pub fn expected_answer(&self) -> String {
        match &self.correct_answer {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.expected_answer()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encouragement {
    Excellent,
    Good,
    KeepPracticing,
}

impl Encouragement {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= EXCELLENT_PERCENT {
            Self::Excellent
        } else if percentage >= GOOD_PERCENT {
            Self::Good
        } else {
            Self::KeepPracticing
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent! You've demonstrated a strong understanding across multiple subjects."
            }
            Self::Good => "Good effort! Keep practicing to improve your score further.",
            Self::KeepPracticing => "Keep practicing! Focus on the subjects where you scored lower.",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectTally {
    pub correct: u32,
    pub total: u32,
}

impl SubjectTally {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockTestReport {
    pub correct: u32,
    pub total: u32,
    pub percentage: f64,
    #[serde(with = "crate::types::ordered_map")]
    pub subject_breakdown: Vec<(String, SubjectTally)>,
    pub encouragement: Encouragement,
    pub message: String,
}

impl MockTestReport {
    pub fn summary(&self) -> String {
        format!("{}/{} ({:.1}%)", self.correct, self.total, self.percentage)
    }
}

pub fn grade_mock_test(
    questions: &[MockQuestion],
    answers: &[String],
) -> Result<MockTestReport, MockError> {
    if questions.is_empty() || questions.len() != answers.len() {
        return Err(MockError::InvalidSubmission {
            expected: questions.len(),
            actual: answers.len(),
        });
    }

    let mut correct = 0u32;
    let mut breakdown: Vec<(String, SubjectTally)> = Vec::new();

    for (question, answer) in questions.iter().zip(answers) {
        let hit = question.is_correct(answer);
        if hit {
            correct += 1;
        }

        let idx = match breakdown.iter().position(|(s, _)| *s == question.subject) {
            Some(idx) => idx,
            None => {
                breakdown.push((question.subject.clone(), SubjectTally::default()));
                breakdown.len() - 1
            }
        };
        let tally = &mut breakdown[idx].1;
        tally.total += 1;
        if hit {
            tally.correct += 1;
        }
    }

    let total = questions.len() as u32;
    let percentage = correct as f64 / total as f64 * 100.0;
    let encouragement = Encouragement::from_percentage(percentage);

    Ok(MockTestReport {
        correct,
        total,
        percentage,
        subject_breakdown: breakdown,
        encouragement,
        message: encouragement.message().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(subject: &str, answer: serde_json::Value) -> MockQuestion {
        MockQuestion {
            question: "?".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: answer,
            explanation: String::new(),
            subject: subject.to_string(),
            kind: QuestionKind::SingleAnswer,
        }
    }

    #[test]
    fn test_numeric_answers_compare_by_string_form() {
        let question = q("Math", json!(2));
        assert!(question.is_correct("2"));
        assert!(!question.is_correct("3"));
        assert!(q("Math", json!("B")).is_correct("B"));
    }

    #[test]
    fn test_grade_breakdown_and_message() {
        let questions = vec![
            q("Math", json!(1)),
            q("Networks", json!(0)),
            q("Math", json!(3)),
            q("Math", json!(2)),
        ];
        let answers: Vec<String> = ["1", "0", "0", "2"].iter().map(|s| s.to_string()).collect();
        let report = grade_mock_test(&questions, &answers).unwrap();

        assert_eq!(report.correct, 3);
        assert_eq!(report.total, 4);
        assert_eq!(report.percentage, 75.0);
        assert_eq!(report.encouragement, Encouragement::Excellent);
        assert_eq!(report.subject_breakdown[0].0, "Math");
        assert_eq!(report.subject_breakdown[0].1, SubjectTally { correct: 2, total: 3 });
        assert_eq!(report.summary(), "3/4 (75.0%)");
    }

    #[test]
    fn test_encouragement_tiers() {
        assert_eq!(Encouragement::from_percentage(70.0), Encouragement::Excellent);
        assert_eq!(Encouragement::from_percentage(50.0), Encouragement::Good);
        assert_eq!(Encouragement::from_percentage(49.9), Encouragement::KeepPracticing);
    }

    #[test]
    fn test_mismatched_or_empty_submission_rejected() {
        let questions = vec![q("Math", json!(1))];
        assert!(grade_mock_test(&questions, &[]).is_err());
        assert!(grade_mock_test(&[], &[]).is_err());
    }
}
