//! Domain models for archive entities

mod list;
mod message;
mod topic;

pub use list::{ListId, MailingList};
pub use message::{Message, MessageBuilder, MessageHeader, MessageId};
pub use topic::{Topic, TopicId};

/// A schemaless document record as stored in a document collection
pub type Document = serde_json::Map<String, serde_json::Value>;
