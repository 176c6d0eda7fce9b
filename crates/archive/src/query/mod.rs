//! Query API for browsing the archive
//!
//! High-level listing functions built on the metadata store.

mod topics;

pub use topics::{Page, page_topics};
