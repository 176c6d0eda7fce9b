//! Metadata store over the archive's document collections

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ArchiveError, Result};
use crate::ledger::DedupLedger;
use crate::models::{Document, ListId, MailingList, MessageHeader, Topic, TopicId};
use crate::storage::{Collection, DocumentStore, Filter, Query, Sort};
use crate::validate;

/// CRUD over the lists, topics, messages and processed collections
///
/// Message and topic records are shape-checked before every write; a
/// rejected record never reaches the document store.
#[derive(Clone)]
pub struct MetadataStore {
    store: Arc<dyn DocumentStore>,
    ledger: DedupLedger,
}

impl MetadataStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let ledger = DedupLedger::new(store.clone());
        Self { store, ledger }
    }

    /// The processed-URL ledger sharing this store's connection
    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Insert or replace a record
    ///
    /// The stored record becomes exactly `record`. A record carrying an
    /// `_id` different from `id` is rejected.
    pub fn upsert(&self, collection: Collection, id: &str, record: Document) -> Result<()> {
        validate::identifier(id, collection.name())?;
        if let Some(existing) = record.get("_id")
            && existing.as_str() != Some(id)
        {
            return Err(ArchiveError::validation(format!(
                "Record _id {existing} does not match {id}"
            )));
        }

        let mut record = Value::Object(record);
        record["_id"] = Value::String(id.to_string());
        match collection {
            Collection::Messages => validate::message_header(&record)?,
            Collection::Topics => validate::subject(&record)?,
            Collection::Processed => validate::processed_url(id)?,
            Collection::Lists => {}
        }

        match record {
            Value::Object(record) => self.store.upsert(collection, id, record)?,
            _ => return Err(ArchiveError::validation("Record must be an object")),
        }
        log::debug!("[STORE] Upserted {} in {}", id, collection);
        Ok(())
    }

    /// Find a record by primary identifier
    pub fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        self.store.find_one(collection, &Filter::by_id(id))
    }

    /// Find records matching a filter, optionally sorted and windowed
    pub fn find_many(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Option<Sort>,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Document>> {
        let query = Query {
            filter,
            sort,
            skip,
            limit,
        };
        self.store.find(collection, &query)
    }

    /// Count records matching a filter
    pub fn count(&self, collection: Collection, filter: &Filter) -> Result<usize> {
        self.store.count(collection, filter)
    }

    /// Store message metadata (without body)
    pub fn upsert_message_header(&self, header: &MessageHeader) -> Result<()> {
        validate::no_reserved_fields(&header.headers, validate::MESSAGE_FIELDS, "Message")?;
        self.upsert(Collection::Messages, header.id.as_str(), to_document(header)?)
    }

    /// Metadata of every message in a topic, oldest first
    pub fn message_headers(&self, subject_token: &TopicId) -> Result<Vec<MessageHeader>> {
        let docs = self.find_many(
            Collection::Messages,
            Filter::eq("subjectToken", subject_token.as_str()),
            Some(Sort::ascending("date")),
            0,
            None,
        )?;
        docs.into_iter().map(from_document).collect()
    }

    /// Store a topic, replacing any previous version
    pub fn upsert_topic(&self, topic: &Topic) -> Result<()> {
        validate::no_reserved_fields(&topic.fields, validate::TOPIC_FIELDS, "Subject")?;
        self.upsert(Collection::Topics, topic.id.as_str(), to_document(topic)?)
    }

    pub fn topic(&self, id: &TopicId) -> Result<Option<Topic>> {
        self.find_by_id(Collection::Topics, id.as_str())?
            .map(from_document)
            .transpose()
    }

    /// Topics matching a query, decoded
    pub fn topics(&self, query: &Query) -> Result<Vec<Topic>> {
        self.store
            .find(Collection::Topics, query)?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Store a mailing list, replacing any previous version
    pub fn upsert_list(&self, list: &MailingList) -> Result<()> {
        validate::no_reserved_fields(&list.attributes, &["_id"], "List")?;
        self.upsert(Collection::Lists, list.id.as_str(), to_document(list)?)
    }

    pub fn list(&self, id: &ListId) -> Result<Option<MailingList>> {
        self.find_by_id(Collection::Lists, id.as_str())?
            .map(from_document)
            .transpose()
    }

    /// All mailing lists in store order
    pub fn lists(&self) -> Result<Vec<MailingList>> {
        self.find_many(Collection::Lists, Filter::all(), None, 0, None)?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Release the underlying document store connection
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore").finish_non_exhaustive()
    }
}

/// Serialize a model into a document record
pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(ArchiveError::validation(format!(
            "Expected a record object, got {other}"
        ))),
    }
}

/// Decode a stored document into a model
///
/// A stored record that does not decode is malformed data from the store,
/// reported as a transport failure.
pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    let id = doc
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| ArchiveError::Transport(anyhow::anyhow!("Malformed record {id}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDocumentStore;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn store() -> (MetadataStore, Arc<InMemoryDocumentStore>) {
        let docs = Arc::new(InMemoryDocumentStore::new());
        (MetadataStore::new(docs.clone()), docs)
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_upsert_is_replace_not_merge() {
        let (store, _) = store();
        store
            .upsert(Collection::Lists, "l1", doc(json!({ "name": "A", "old": 1 })))
            .unwrap();
        store
            .upsert(Collection::Lists, "l1", doc(json!({ "name": "B" })))
            .unwrap();

        let found = store.find_by_id(Collection::Lists, "l1").unwrap().unwrap();
        assert_eq!(found, doc(json!({ "_id": "l1", "name": "B" })));
    }

    #[test]
    fn test_invalid_topic_is_never_written() {
        let (store, docs) = store();
        let err = store
            .upsert(Collection::Topics, "t1", doc(json!({ "end": 5 })))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(docs.len(Collection::Topics), 0);
    }

    #[test]
    fn test_message_record_with_body_is_rejected() {
        let (store, docs) = store();
        let err = store
            .upsert(
                Collection::Messages,
                "m1",
                doc(json!({ "subjectToken": "t1", "date": 1, "body": "text" })),
            )
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(docs.len(Collection::Messages), 0);
    }

    #[test]
    fn test_mismatched_id_is_rejected() {
        let (store, _) = store();
        let err = store
            .upsert(Collection::Lists, "l1", doc(json!({ "_id": "l2" })))
            .unwrap_err();
        assert!(err.is_validation());

        assert!(store.upsert(Collection::Lists, "", Document::new()).is_err());
    }

    #[test]
    fn test_find_many_window() {
        let (store, _) = store();
        for i in 0..5 {
            store
                .upsert_topic(&Topic::new(format!("t{i}"), "list", at(i * 10)))
                .unwrap();
        }

        let docs = store
            .find_many(
                Collection::Topics,
                Filter::eq("source", "list"),
                Some(Sort::descending("end")),
                1,
                Some(2),
            )
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["t3", "t2"]);
    }

    #[test]
    fn test_typed_topic_round_trip() {
        let (store, _) = store();
        let topic = Topic::new("t1", "es-discuss", at(1_000)).with_field("subject", "Modules");

        store.upsert_topic(&topic).unwrap();

        assert_eq!(store.topic(&TopicId::new("t1")).unwrap(), Some(topic));
        assert_eq!(store.topic(&TopicId::new("missing")).unwrap(), None);
    }

    #[test]
    fn test_topic_with_reserved_field_is_rejected() {
        let (store, _) = store();
        let topic = Topic::new("t1", "list", at(1)).with_field("source", "other");

        assert!(store.upsert_topic(&topic).unwrap_err().is_validation());
    }

    #[test]
    fn test_malformed_stored_record_is_transport_error() {
        let (store, docs) = store();
        // Written behind the metadata store's back
        docs.upsert(
            Collection::Topics,
            "t1",
            doc(json!({ "source": "list", "end": "not a number" })),
        )
        .unwrap();

        let err = store.topic(&TopicId::new("t1")).unwrap_err();
        assert!(matches!(err, ArchiveError::Transport(_)));
    }

    #[test]
    fn test_lists() {
        let (store, _) = store();
        store
            .upsert_list(&MailingList::new("es-discuss").with_attribute("name", "ES Discuss"))
            .unwrap();
        store.upsert_list(&MailingList::new("whatwg")).unwrap();

        let lists = store.lists().unwrap();
        assert_eq!(lists.len(), 2);

        let list = store.list(&ListId::new("es-discuss")).unwrap().unwrap();
        assert_eq!(list.attributes["name"], json!("ES Discuss"));
    }
}
