//! Topic Catalog
//!
//! Read-only reference data: subjects, their subtopics and key learning points.

use serde::{Deserialize, Serialize};

use crate::types::TopicKey;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub topics: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub title: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    pub title: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self { topics: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn subject_count(&self) -> usize {
        self.topics.len()
    }

    pub fn subject(&self, title: &str) -> Option<&Subject> {
        self.topics.iter().find(|s| s.title == title)
    }

    pub fn subject_titles(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|s| s.title.as_str())
    }

    /// Every `(subject, subtopic)` key, in catalog order.
    pub fn seed_keys(&self) -> impl Iterator<Item = TopicKey> + '_ {
        self.topics.iter().flat_map(|subject| {
            subject
                .subtopics
                .iter()
                .map(move |sub| TopicKey::subtopic(subject.title.as_str(), sub.title.as_str()))
        })
    }
}
