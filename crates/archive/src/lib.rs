//! Archive crate - Persistence layer for archived mailing lists
//!
//! This crate provides:
//! - Domain models (MailingList, Topic, Message)
//! - Content-addressed blob storage for message bodies
//! - A document-store abstraction with SQLite and in-memory backends
//! - A dedup ledger of already-ingested source URLs
//! - The `ArchiveRepository` façade: ingestion, retrieval and paginated
//!   topic listing
//!
//! Calls are blocking. Callers on an async runtime should run them on a
//! blocking thread.

pub mod config;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod models;
pub mod query;
pub mod repository;
pub mod storage;
pub mod validate;

pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};
pub use ledger::DedupLedger;
pub use metadata::MetadataStore;
pub use models::{
    Document, ListId, MailingList, Message, MessageBuilder, MessageHeader, MessageId, Topic,
    TopicId,
};
pub use query::{Page, page_topics};
pub use repository::ArchiveRepository;
pub use storage::{
    BlobAddress, BlobStore, BucketCredentials, Collection, Direction, DocumentStore, FileBlobStore,
    Filter, InMemoryBlobStore, InMemoryDocumentStore, Query, Sort, SqliteDocumentStore,
};
