//! Topic Recommendation
//!
//! Priority = (1 - score), boosted for untried topics and grown linearly with
//! the whole days elapsed since the last attempt. The recency factor has no cap.

use chrono::{DateTime, Utc};

use crate::types::{TopicKey, TopicProgress, UserState, RECENCY_PER_DAY, UNTRIED_BOOST};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `last` and `now`, rounded down.
pub fn days_since(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn priority(progress: &TopicProgress, now: DateTime<Utc>) -> f64 {
    let mut priority = 1.0 - progress.score;

    if progress.attempts == 0 {
        priority *= UNTRIED_BOOST;
    }

    if let Some(last) = progress.last_attempt {
        priority *= 1.0 + RECENCY_PER_DAY * days_since(last, now) as f64;
    }

    priority
}

/// Top `n` topics by descending priority. Ties keep document order.
pub fn recommend(state: &UserState, n: usize, now: DateTime<Utc>) -> Vec<TopicKey> {
    let mut ranked: Vec<(&TopicKey, f64)> = state
        .topic_scores
        .iter()
        .map(|(key, progress)| (key, priority(progress, now)))
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(n)
        .map(|(key, _)| key.clone())
        .collect()
}
