//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ==================== Constants ====================

/// Separator between subject and subtopic in a topic key
pub const TOPIC_SEPARATOR: &str = " - ";

/// EMA smoothing factor
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Score an attempt must reach to clear the current level
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Maximum number of entries in a learning path
pub const MAX_PATH_LEN: usize = 8;

/// Boost applied to topics that were never attempted
pub const UNTRIED_BOOST: f64 = 1.2;

/// Priority growth per day since the last attempt
pub const RECENCY_PER_DAY: f64 = 0.1;

// ==================== Difficulty ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
        }
    }

    /// Level reached after clearing this one. `Advanced` stays `Advanced`.
    pub fn next(self) -> Self {
        match self {
            Self::Beginner => Self::Intermediate,
            Self::Intermediate | Self::Advanced => Self::Advanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown difficulty level: {other}")),
        }
    }
}

// ==================== Topic keys ====================

/// Identifies either a bare subject or a subtopic within a subject.
///
/// The string form is `"<subject>"` or `"<subject> - <subtopic>"`; parsing
/// splits on the first separator, so a subtopic title may itself contain it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicKey {
    Subject(String),
    Subtopic { subject: String, subtopic: String },
}

impl TopicKey {
    /// Both constructors normalize through [`TopicKey::parse`], so a title
    /// containing the separator yields the same key its string form would.
    pub fn subject_only(subject: impl Into<String>) -> Self {
        Self::parse(&subject.into())
    }

    pub fn subtopic(subject: impl Into<String>, subtopic: impl Into<String>) -> Self {
        let subject = subject.into();
        let subtopic = subtopic.into();
        match subject.split_once(TOPIC_SEPARATOR) {
            Some((head, rest)) => Self::Subtopic {
                subject: head.to_string(),
                subtopic: format!("{rest}{TOPIC_SEPARATOR}{subtopic}"),
            },
            None => Self::Subtopic { subject, subtopic },
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.split_once(TOPIC_SEPARATOR) {
            Some((subject, subtopic)) => Self::Subtopic {
                subject: subject.to_string(),
                subtopic: subtopic.to_string(),
            },
            None => Self::Subject(raw.to_string()),
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Self::Subject(subject) => subject,
            Self::Subtopic { subject, .. } => subject,
        }
    }

    /// Key of the subject this topic belongs to.
    pub fn to_subject_key(&self) -> Self {
        Self::Subject(self.subject().to_string())
    }

    pub fn is_subject(&self) -> bool {
        matches!(self, Self::Subject(_))
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject(subject) => f.write_str(subject),
            Self::Subtopic { subject, subtopic } => {
                write!(f, "{subject}{TOPIC_SEPARATOR}{subtopic}")
            }
        }
    }
}

impl From<&str> for TopicKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for TopicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TopicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// ==================== Progress ====================

/// Per-topic learning record.
///
/// `attempts` and `correct` count answers since the last promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub score: f64,
    pub attempts: u32,
    pub correct: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub difficulty_level: DifficultyLevel,
    pub mastered: bool,
    #[serde(default)]
    pub subtopics: serde_json::Map<String, serde_json::Value>,
}

impl TopicProgress {
    pub fn fresh() -> Self {
        Self {
            score: 0.0,
            attempts: 0,
            correct: 0,
            last_attempt: None,
            difficulty_level: DifficultyLevel::Beginner,
            mastered: false,
            subtopics: serde_json::Map::new(),
        }
    }

    /// Clears the counters kept since the last promotion.
    pub fn reset_counters(&mut self) {
        self.score = 0.0;
        self.correct = 0;
        self.attempts = 0;
    }
}

impl Default for TopicProgress {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Topic progress keyed by topic, in insertion order.
///
/// Serialized as a JSON object; document key order is kept on both
/// serialization and deserialization since recommendation ties fall back to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicScores {
    entries: Vec<(TopicKey, TopicProgress)>,
}

impl TopicScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &TopicKey) -> Option<&TopicProgress> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &TopicKey) -> Option<&mut TopicProgress> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &TopicKey) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces; a replaced entry keeps its position.
    pub fn insert(&mut self, key: TopicKey, progress: TopicProgress) {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => self.entries[idx].1 = progress,
            None => self.entries.push((key, progress)),
        }
    }

    pub fn entry_or_fresh(&mut self, key: TopicKey) -> &mut TopicProgress {
        let idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key, TopicProgress::fresh()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicKey, &TopicProgress)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &TopicKey> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl FromIterator<(TopicKey, TopicProgress)> for TopicScores {
    fn from_iter<I: IntoIterator<Item = (TopicKey, TopicProgress)>>(iter: I) -> Self {
        let mut scores = Self::new();
        for (key, progress) in iter {
            scores.insert(key, progress);
        }
        scores
    }
}

impl Serialize for TopicScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, progress) in &self.entries {
            map.serialize_entry(key, progress)?;
        }
        map.end()
    }
}

struct TopicScoresVisitor;

impl<'de> Visitor<'de> for TopicScoresVisitor {
    type Value = TopicScores;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of topic keys to topic progress")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut scores = TopicScores::new();
        while let Some((key, progress)) = access.next_entry::<TopicKey, TopicProgress>()? {
            scores.insert(key, progress);
        }
        Ok(scores)
    }
}

impl<'de> Deserialize<'de> for TopicScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TopicScoresVisitor)
    }
}

// ==================== User state ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPathEntry {
    pub topic: String,
    pub key_points: Vec<String>,
    pub examples: Vec<String>,
    pub current_score: f64,
    pub difficulty_level: DifficultyLevel,
    pub attempts: u32,
}

/// The persisted learning document of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    pub user_id: String,
    pub topic_scores: TopicScores,
    #[serde(default)]
    pub questions_answered: Vec<serde_json::Value>,
    #[serde(default)]
    pub learning_path: Vec<LearningPathEntry>,
    #[serde(default = "default_current_level")]
    pub current_level: u32,
    pub timestamp: DateTime<Utc>,
}

fn default_current_level() -> u32 {
    1
}

impl UserState {
    pub fn empty(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            topic_scores: TopicScores::new(),
            questions_answered: Vec::new(),
            learning_path: Vec::new(),
            current_level: default_current_level(),
            timestamp: now,
        }
    }

    /// Refreshes `timestamp`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.timestamp {
            self.timestamp = now;
        }
    }
}

// ==================== Results ====================

/// Outcome of a single `record_answer` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// The attempt's own score, not the running average
    pub score: f64,
    pub current_difficulty: DifficultyLevel,
    pub threshold_met: bool,
    pub threshold: f64,
    pub difficulty_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub difficulty_level: DifficultyLevel,
    pub score: f64,
    pub topics_completed: u32,
    pub total_topics: u32,
}

impl Default for SubjectProgress {
    fn default() -> Self {
        Self {
            difficulty_level: DifficultyLevel::Beginner,
            score: 0.0,
            topics_completed: 0,
            total_topics: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub user_id: String,
    /// Subjects in first-seen order
    #[serde(with = "ordered_map")]
    pub subjects: Vec<(String, SubjectProgress)>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressReport {
    pub fn subject(&self, name: &str) -> Option<&SubjectProgress> {
        self.subjects
            .iter()
            .find(|(subject, _)| subject == name)
            .map(|(_, progress)| progress)
    }
}

/// (De)serializes a `Vec<(String, V)>` as a JSON object, keeping entry order.
pub mod ordered_map {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
