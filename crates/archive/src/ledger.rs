//! Dedup ledger of already-ingested source URLs

use std::sync::Arc;

use log::{debug, warn};

use crate::error::Result;
use crate::models::Document;
use crate::storage::{Collection, DocumentStore, Filter};
use crate::validate;

/// Records which source URLs have already been ingested
///
/// A ledger entry is a tombstone: only its existence matters. Marking is an
/// upsert keyed by the URL, so re-running an ingestion after a partial
/// failure never trips over its own earlier marks.
#[derive(Clone)]
pub struct DedupLedger {
    store: Arc<dyn DocumentStore>,
}

impl DedupLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Test whether a source URL has been processed
    ///
    /// Invalid URLs are rejected with a validation error. Any lookup failure
    /// is reported as "not processed": re-processing a message is preferred
    /// over silently skipping it.
    pub fn is_processed(&self, url: &str) -> Result<bool> {
        validate::processed_url(url)?;

        match self.store.count(Collection::Processed, &Filter::by_id(url)) {
            Ok(count) => Ok(count != 0),
            Err(e) => {
                warn!("[LEDGER] Lookup for {} failed, treating as unprocessed: {}", url, e);
                Ok(false)
            }
        }
    }

    /// Mark a source URL as processed
    ///
    /// Marking the same URL again is a no-op.
    pub fn mark_processed(&self, url: &str) -> Result<()> {
        validate::processed_url(url)?;
        self.store.upsert(Collection::Processed, url, Document::new())?;
        debug!("[LEDGER] Marked {} as processed", url);
        Ok(())
    }
}

impl std::fmt::Debug for DedupLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupLedger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::storage::{InMemoryDocumentStore, Query};
    use anyhow::anyhow;

    /// Store whose every call fails, as if the database were unreachable
    struct UnreachableStore;

    impl DocumentStore for UnreachableStore {
        fn find(&self, _: Collection, _: &Query) -> Result<Vec<Document>> {
            Err(ArchiveError::Transport(anyhow!("connection refused")))
        }

        fn upsert(&self, _: Collection, _: &str, _: Document) -> Result<()> {
            Err(ArchiveError::Transport(anyhow!("connection refused")))
        }

        fn count(&self, _: Collection, _: &Filter) -> Result<usize> {
            Err(ArchiveError::Transport(anyhow!("connection refused")))
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn ledger() -> (DedupLedger, Arc<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        (DedupLedger::new(store.clone()), store)
    }

    #[test]
    fn test_mark_twice_then_processed() {
        let (ledger, store) = ledger();
        let url = "https://mail.mozilla.org/pipermail/es-discuss/2014-May/037000.html";

        assert!(!ledger.is_processed(url).unwrap());

        ledger.mark_processed(url).unwrap();
        ledger.mark_processed(url).unwrap();

        assert!(ledger.is_processed(url).unwrap());
        assert_eq!(store.len(Collection::Processed), 1);
    }

    #[test]
    fn test_unmarked_url_is_not_processed() {
        let (ledger, _) = ledger();
        ledger.mark_processed("http://example.com/a").unwrap();

        assert!(!ledger.is_processed("http://example.com/b").unwrap());
    }

    #[test]
    fn test_rejects_non_http_urls() {
        let (ledger, store) = ledger();

        assert!(ledger.is_processed("ftp://example.com/a").unwrap_err().is_validation());
        assert!(ledger.mark_processed("ftp://example.com/a").unwrap_err().is_validation());
        assert!(ledger.mark_processed("").unwrap_err().is_validation());
        assert_eq!(store.len(Collection::Processed), 0);
    }

    #[test]
    fn test_lookup_failure_means_unprocessed() {
        let ledger = DedupLedger::new(Arc::new(UnreachableStore));

        assert!(!ledger.is_processed("https://example.com/a").unwrap());
    }

    #[test]
    fn test_mark_failure_propagates() {
        let ledger = DedupLedger::new(Arc::new(UnreachableStore));

        let err = ledger.mark_processed("https://example.com/a").unwrap_err();
        assert!(matches!(err, ArchiveError::Transport(_)));
    }
}
