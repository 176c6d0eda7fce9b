//! In-memory blob storage

use std::collections::HashMap;
use std::sync::RwLock;

use super::blob::{BlobAddress, BlobStore};
use crate::error::{ArchiveError, Result};

/// HashMap-based blob store for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobAddress, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, address: &BlobAddress, payload: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.write().unwrap();
        blobs.insert(address.clone(), payload.to_vec());
        Ok(())
    }

    fn get(&self, address: &BlobAddress) -> Result<Vec<u8>> {
        let blobs = self.blobs.read().unwrap();
        blobs
            .get(address)
            .cloned()
            .ok_or_else(|| ArchiveError::not_found(format!("blob {address}")))
    }
}
