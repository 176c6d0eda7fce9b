//! Storage traits and implementations
//!
//! Metadata lives in a [`DocumentStore`]; message bodies live in a
//! [`BlobStore`] addressed by a digest of the message id. Both traits have an
//! in-memory implementation for tests and a persistent one.

mod blob;
mod blob_file;
mod blob_memory;
mod credentials;
mod memory;
mod sqlite;
mod traits;

pub use blob::{BODY_FILE, BlobAddress, BlobStore, body_digest};
pub use blob_file::FileBlobStore;
pub use blob_memory::InMemoryBlobStore;
pub use credentials::BucketCredentials;
pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use traits::{Collection, Direction, DocumentStore, Filter, Query, Sort, compare_values};
