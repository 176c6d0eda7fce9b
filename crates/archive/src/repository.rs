//! Archive repository combining metadata and blob storage

use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde_json::Value;

use crate::error::{ArchiveError, Result};
use crate::metadata::{MetadataStore, to_document};
use crate::models::{ListId, MailingList, Message, MessageHeader, Topic, TopicId};
use crate::query::{self, Page};
use crate::storage::{BlobAddress, BlobStore, DocumentStore};
use crate::validate;

/// Entry point to the archive
///
/// Message metadata goes to the document store, message bodies to the blob
/// store. Without a blob store the repository runs metadata-only: bodies are
/// dropped on ingestion and messages come back without one.
#[derive(Clone)]
pub struct ArchiveRepository {
    metadata: MetadataStore,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl ArchiveRepository {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            metadata: MetadataStore::new(documents),
            blobs: Some(blobs),
        }
    }

    /// Create a repository that stores no message bodies
    pub fn metadata_only(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            metadata: MetadataStore::new(documents),
            blobs: None,
        }
    }

    pub fn is_metadata_only(&self) -> bool {
        self.blobs.is_none()
    }

    /// The metadata store, for direct collection access
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Ingest a message
    ///
    /// The metadata upsert and the body put run concurrently. The call
    /// succeeds only if both do, but the two writes are not atomic: when one
    /// fails the other may already have landed.
    pub fn add_message(&self, message: Message) -> Result<()> {
        let (header, body) = message.into_parts();
        let body = body.ok_or_else(|| ArchiveError::validation("Message body is required"))?;
        validate::no_reserved_fields(&header.headers, validate::MESSAGE_FIELDS, "Message")?;
        validate::message_header(&Value::Object(to_document(&header)?))?;

        let Some(blobs) = &self.blobs else {
            self.metadata.upsert_message_header(&header)?;
            debug!(
                "[ARCHIVE] Added {} without body (metadata-only)",
                header.id.as_str()
            );
            return Ok(());
        };

        let address = BlobAddress::for_message(&header.id);
        let (stored, put) = rayon::join(
            || self.metadata.upsert_message_header(&header),
            || blobs.put(&address, body.as_bytes()),
        );

        match (stored, put) {
            (Ok(()), Ok(())) => {
                debug!(
                    "[ARCHIVE] Added {} to {}",
                    header.id.as_str(),
                    header.subject_token.as_str()
                );
                Ok(())
            }
            (Err(e), Ok(())) => {
                warn!(
                    "[ARCHIVE] Metadata write for {} failed after body was stored",
                    header.id.as_str()
                );
                Err(e)
            }
            (Ok(()), Err(e)) => {
                warn!(
                    "[ARCHIVE] Body write for {} failed after metadata was stored",
                    header.id.as_str()
                );
                Err(e)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }

    /// All messages of a topic with their bodies, oldest first
    ///
    /// Bodies are fetched in parallel; the result keeps the metadata order.
    /// A message whose body blob is missing fails the whole call with
    /// `NotFound`.
    pub fn get_messages(&self, subject_token: &TopicId) -> Result<Vec<Message>> {
        let headers = self.metadata.message_headers(subject_token)?;

        let Some(blobs) = &self.blobs else {
            return Ok(headers.into_iter().map(|h| h.with_body(None)).collect());
        };

        let messages = headers
            .into_par_iter()
            .map(|header| {
                let bytes = blobs.get(&BlobAddress::for_message(&header.id))?;
                Ok(header.with_body(Some(decode_body(bytes))))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "[ARCHIVE] Loaded {} messages for {}",
            messages.len(),
            subject_token.as_str()
        );
        Ok(messages)
    }

    /// Message metadata of a topic, oldest first, without fetching bodies
    pub fn get_message_headers(&self, subject_token: &TopicId) -> Result<Vec<MessageHeader>> {
        self.metadata.message_headers(subject_token)
    }

    pub fn get_topic(&self, id: &TopicId) -> Result<Option<Topic>> {
        self.metadata.topic(id)
    }

    /// Store a topic, replacing the previous version
    pub fn update_subject(&self, topic: &Topic) -> Result<()> {
        self.metadata.upsert_topic(topic)
    }

    pub fn get_lists(&self) -> Result<Vec<MailingList>> {
        self.metadata.lists()
    }

    pub fn get_list(&self, id: &ListId) -> Result<Option<MailingList>> {
        self.metadata.list(id)
    }

    /// One page of topics, most recently active first
    ///
    /// `source` restricts the listing to one list; `None` lists every topic.
    pub fn get_page(
        &self,
        source: Option<&ListId>,
        page_index: usize,
        page_size: usize,
    ) -> Result<Page<Topic>> {
        query::page_topics(&self.metadata, source, page_index, page_size)
    }

    /// Whether a source URL has already been ingested
    pub fn is_processed(&self, url: &str) -> Result<bool> {
        self.metadata.ledger().is_processed(url)
    }

    pub fn mark_processed(&self, url: &str) -> Result<()> {
        self.metadata.ledger().mark_processed(url)
    }

    /// Release the document store connection
    pub fn close(self) -> Result<()> {
        self.metadata.close()?;
        info!("[ARCHIVE] Repository closed");
        Ok(())
    }
}

impl std::fmt::Debug for ArchiveRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveRepository")
            .field("metadata_only", &self.is_metadata_only())
            .finish_non_exhaustive()
    }
}

fn decode_body(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| {
        warn!("[ARCHIVE] Message body is not valid UTF-8, decoding lossily");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}
