//! Mailing list model

use serde::{Deserialize, Serialize};

use super::Document;

/// Unique identifier for a mailing list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListId(pub String);

impl ListId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ListId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ListId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A mailing list with its display attributes
///
/// Populated by an external importer; the archive only reads lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailingList {
    #[serde(rename = "_id")]
    pub id: ListId,
    #[serde(flatten)]
    pub attributes: Document,
}

impl MailingList {
    pub fn new(id: impl Into<ListId>) -> Self {
        Self {
            id: id.into(),
            attributes: Document::new(),
        }
    }

    /// Builder method to set a display attribute
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}
