//! Message model representing a single archived mailing-list post

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Document, TopicId};

/// Unique identifier for a message
///
/// Also the seed for the content address of the message body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Message metadata as persisted in the document store
///
/// Never carries the body. Any header not modelled explicitly (from, to,
/// url, ...) is kept verbatim in `headers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    #[serde(rename = "_id")]
    pub id: MessageId,
    /// Topic this message belongs to
    #[serde(rename = "subjectToken")]
    pub subject_token: TopicId,
    /// Ordering key within a topic
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub headers: Document,
}

impl MessageHeader {
    /// Reattach a body fetched from blob storage
    pub fn with_body(self, body: Option<String>) -> Message {
        Message { header: self, body }
    }
}

/// A full message: metadata plus body text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(flatten)]
    pub header: MessageHeader,
    /// Raw body text
    ///
    /// `None` only for messages read back from a metadata-only archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Message {
    /// Create a new message builder
    pub fn builder(id: impl Into<MessageId>, subject_token: impl Into<TopicId>) -> MessageBuilder {
        MessageBuilder::new(id.into(), subject_token.into())
    }

    pub fn id(&self) -> &MessageId {
        &self.header.id
    }

    pub fn subject_token(&self) -> &TopicId {
        &self.header.subject_token
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.header.date
    }

    /// Split into the metadata record and the body destined for blob storage
    pub fn into_parts(self) -> (MessageHeader, Option<String>) {
        (self.header, self.body)
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    subject_token: TopicId,
    date: Option<DateTime<Utc>>,
    body: Option<String>,
    headers: Document,
}

impl MessageBuilder {
    fn new(id: MessageId, subject_token: TopicId) -> Self {
        Self {
            id,
            subject_token,
            date: None,
            body: None,
            headers: Document::new(),
        }
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set an arbitrary header field (from, to, subject, url, ...)
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Message {
        Message {
            header: MessageHeader {
                id: self.id,
                subject_token: self.subject_token,
                date: self.date.unwrap_or_else(Utc::now),
                headers: self.headers,
            },
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Message {
        Message::builder("m1", "t1")
            .date(Utc.timestamp_millis_opt(1_400_000_000_000).unwrap())
            .header("from", "alice@example.com")
            .body("hello")
            .build()
    }

    #[test]
    fn test_serialize_uses_document_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "m1",
                "subjectToken": "t1",
                "date": 1_400_000_000_000_i64,
                "from": "alice@example.com",
                "body": "hello",
            })
        );
    }

    #[test]
    fn test_header_omits_body() {
        let (header, body) = sample().into_parts();
        let value = serde_json::to_value(&header).unwrap();
        assert!(value.get("body").is_none());
        assert_eq!(body.as_deref(), Some("hello"));
    }

    #[test]
    fn test_deserialize_keeps_extra_headers() {
        let message: Message = serde_json::from_value(json!({
            "_id": "m2",
            "subjectToken": "t9",
            "date": 1_000,
            "to": ["a@example.com"],
            "body": "text",
        }))
        .unwrap();

        assert_eq!(message.id().as_str(), "m2");
        assert_eq!(message.subject_token().as_str(), "t9");
        assert_eq!(message.header.headers["to"], json!(["a@example.com"]));
        assert!(!message.header.headers.contains_key("body"));
        assert_eq!(message.body.as_deref(), Some("text"));
    }

    #[test]
    fn test_with_body_round_trip() {
        let original = sample();
        let (header, body) = original.clone().into_parts();
        assert_eq!(header.with_body(body), original);
    }
}
