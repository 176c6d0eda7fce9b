//! Record shape validation
//!
//! Every check here is a pure function over a record and runs before any
//! store is touched, so a rejected write leaves both stores untouched.

use serde_json::Value;

use crate::error::{ArchiveError, Result};
use crate::models::Document;

/// Field names a message record reserves for itself
pub const MESSAGE_FIELDS: &[&str] = &["_id", "subjectToken", "date", "body"];

/// Field names a topic record reserves for itself
pub const TOPIC_FIELDS: &[&str] = &["_id", "source", "end"];

/// Check that a record has the shape of a message
///
/// Requires a non-empty string `_id` and `subjectToken`, an integer
/// millisecond `date` and a string `body`.
pub fn message(record: &Value) -> Result<()> {
    let record = message_fields(record)?;
    match record.get("body") {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ArchiveError::validation("Message body must be a string")),
        None => Err(ArchiveError::validation("Message body is required")),
    }
}

/// Check that a record has the shape of message metadata
///
/// Same as [`message`] except that the record must not carry a body.
pub fn message_header(record: &Value) -> Result<()> {
    let record = message_fields(record)?;
    if record.contains_key("body") {
        return Err(ArchiveError::validation(
            "Message metadata must not carry a body",
        ));
    }
    Ok(())
}

fn message_fields(record: &Value) -> Result<&Document> {
    let record = as_object(record, "Message")?;
    non_empty_string(record, "_id", "Message")?;
    non_empty_string(record, "subjectToken", "Message")?;
    timestamp(record, "date", "Message")?;
    Ok(record)
}

/// Check that a record has the shape of a topic (subject)
///
/// Requires a non-empty string `_id` and `source` and an integer
/// millisecond `end`.
pub fn subject(record: &Value) -> Result<()> {
    let record = as_object(record, "Subject")?;
    non_empty_string(record, "_id", "Subject")?;
    non_empty_string(record, "source", "Subject")?;
    timestamp(record, "end", "Subject")?;
    Ok(())
}

/// Reject free-form fields that would shadow a modelled field
///
/// Serialization flattens free-form fields next to the modelled ones, so a
/// free-form `_id` or `body` would silently replace the real value.
pub fn no_reserved_fields(fields: &Document, reserved: &[&str], kind: &str) -> Result<()> {
    match reserved.iter().find(|name| fields.contains_key(**name)) {
        Some(name) => Err(ArchiveError::validation(format!(
            "{kind} field '{name}' cannot be set as a free-form field"
        ))),
        None => Ok(()),
    }
}

/// Check that a processed-message URL is non-empty and uses an http scheme
pub fn processed_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ArchiveError::validation("The url must be a non-empty string"));
    }
    let parsed = url::Url::parse(url)
        .map_err(|e| ArchiveError::validation(format!("The url '{url}' is invalid: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ArchiveError::validation(format!(
            "The url must start with http, got scheme '{scheme}'"
        ))),
    }
}

/// Check that a storage identifier is a non-empty string
pub fn identifier(id: &str, kind: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ArchiveError::validation(format!("{kind} id must be a non-empty string")));
    }
    Ok(())
}

fn as_object<'a>(record: &'a Value, kind: &str) -> Result<&'a Document> {
    record
        .as_object()
        .ok_or_else(|| ArchiveError::validation(format!("{kind} must be an object")))
}

fn non_empty_string(record: &Document, field: &str, kind: &str) -> Result<()> {
    match record.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(()),
        Some(Value::String(_)) => Err(ArchiveError::validation(format!(
            "{kind} {field} must not be empty"
        ))),
        Some(_) => Err(ArchiveError::validation(format!(
            "{kind} {field} must be a string"
        ))),
        None => Err(ArchiveError::validation(format!("{kind} {field} is required"))),
    }
}

fn timestamp(record: &Document, field: &str, kind: &str) -> Result<()> {
    match record.get(field) {
        Some(v) if v.is_i64() => Ok(()),
        Some(_) => Err(ArchiveError::validation(format!(
            "{kind} {field} must be a millisecond timestamp"
        ))),
        None => Err(ArchiveError::validation(format!("{kind} {field} is required"))),
    }
}
