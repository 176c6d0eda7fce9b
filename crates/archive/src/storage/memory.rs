//! In-memory document store implementation
//!
//! Used for tests and for embedding the archive without a database file.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use serde_json::Value;

use super::traits::{Collection, DocumentStore, Filter, Query};
use crate::error::{ArchiveError, Result};
use crate::models::Document;

/// In-memory implementation of DocumentStore
///
/// Each collection is a BTreeMap keyed by `_id`, so the natural order of a
/// collection is identifier order.
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
    closed: AtomicBool,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        let collections = Collection::ALL
            .iter()
            .map(|c| (*c, BTreeMap::new()))
            .collect();
        Self {
            collections: RwLock::new(collections),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: Collection) -> usize {
        let collections = self.collections.read().unwrap();
        collections.get(&collection).map_or(0, BTreeMap::len)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ArchiveError::Transport(anyhow!("document store is closed")));
        }
        Ok(())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>> {
        self.ensure_open()?;
        let collections = self.collections.read().unwrap();
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> =
            docs.values().filter(|d| query.filter.matches(d)).collect();

        // Stable sort keeps identifier order among equal keys
        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(query.skip)
            .take(limit)
            .cloned()
            .collect())
    }

    fn upsert(&self, collection: Collection, id: &str, mut doc: Document) -> Result<()> {
        self.ensure_open()?;
        doc.insert("_id".to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().unwrap();
        collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    fn count(&self, collection: Collection, filter: &Filter) -> Result<usize> {
        self.ensure_open()?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(&collection)
            .map_or(0, |docs| docs.values().filter(|d| filter.matches(d)).count()))
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
