//! Topic model representing a thread of related messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Document, ListId};

/// Unique identifier for a topic
///
/// Messages reference their topic through `subjectToken`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId(pub String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TopicId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TopicId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A topic (a.k.a. subject) groups messages sharing a `subjectToken`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: TopicId,
    /// List this topic belongs to
    pub source: ListId,
    /// Timestamp of the most recent message in the topic
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
    /// Remaining topic fields (subject line, start, message count, ...)
    #[serde(flatten)]
    pub fields: Document,
}

impl Topic {
    pub fn new(id: impl Into<TopicId>, source: impl Into<ListId>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            end,
            fields: Document::new(),
        }
    }

    /// Builder method to set an additional field
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Advance `end` to `at` if it is more recent
    ///
    /// `end` never moves backwards, so replaying older messages leaves the
    /// topic ordering untouched.
    pub fn advance_end(&mut self, at: DateTime<Utc>) {
        if at > self.end {
            self.end = at;
        }
    }
}
