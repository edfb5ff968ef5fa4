//! Topic Scoring
//!
//! Exponential moving average of attempt scores and the per-topic
//! difficulty state machine:
//!
//! | level        | threshold met                      | not met |
//! |--------------|------------------------------------|---------|
//! | beginner     | -> intermediate, counters reset    | stay    |
//! | intermediate | -> advanced, counters reset        | stay    |
//! | advanced     | mastered, counters reset (once)    | stay    |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::types::{
    DifficultyLevel, TopicProgress, UpdateResult, UserState, DEFAULT_ALPHA, DEFAULT_THRESHOLD,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("correct fraction must be within [0, 1], got {0}")]
    FractionOutOfRange(f64),
}

/// A single threshold applies to every level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub alpha: f64,
    pub threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ScoringConfig {
    pub fn threshold_for(&self, _level: DifficultyLevel) -> f64 {
        self.threshold
    }
}

pub fn validate_fraction(fraction: f64) -> Result<f64, ScoringError> {
    if fraction.is_nan() || !(0.0..=1.0).contains(&fraction) {
        return Err(ScoringError::FractionOutOfRange(fraction));
    }
    Ok(fraction)
}

pub fn ema(previous: f64, sample: f64, alpha: f64) -> f64 {
    alpha * sample + (1.0 - alpha) * previous
}

/// Applies one answered attempt to `progress`.
///
/// `correct` counts any nonzero fraction while the EMA takes the raw
/// fraction. Once a topic is mastered, further qualifying answers do not
/// reset it again.
pub fn apply_answer(
    progress: &mut TopicProgress,
    fraction: f64,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> UpdateResult {
    progress.attempts += 1;
    if fraction > 0.0 {
        progress.correct += 1;
    }
    progress.score = ema(progress.score, fraction, config.alpha);
    progress.last_attempt = Some(now);

    let threshold = config.threshold_for(progress.difficulty_level);
    let threshold_met = fraction >= threshold;

    let difficulty_changed = threshold_met && promote(progress);
    if difficulty_changed {
        progress.reset_counters();
    }

    UpdateResult {
        score: fraction,
        current_difficulty: progress.difficulty_level,
        threshold_met,
        threshold,
        difficulty_changed,
    }
}

/// Advances the state machine one step; returns whether anything changed.
fn promote(progress: &mut TopicProgress) -> bool {
    match progress.difficulty_level {
        DifficultyLevel::Beginner | DifficultyLevel::Intermediate => {
            progress.difficulty_level = progress.difficulty_level.next();
            true
        }
        DifficultyLevel::Advanced if !progress.mastered => {
            progress.mastered = true;
            true
        }
        DifficultyLevel::Advanced => false,
    }
}

/// Fresh state with one beginner entry per catalog subtopic.
pub fn initial_state(user_id: &str, catalog: &Catalog, now: DateTime<Utc>) -> UserState {
    let mut state = UserState::empty(user_id, now);
    for key in catalog.seed_keys() {
        state.topic_scores.insert(key, TopicProgress::fresh());
    }
    state
}
