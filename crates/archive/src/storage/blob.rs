//! Blob storage trait for message bodies

use std::fmt;

use sha2::{Digest, Sha512};

use crate::error::{ArchiveError, Result};
use crate::models::MessageId;

/// File name of a message's original body under its digest directory
pub const BODY_FILE: &str = "original.md";

/// Address of a blob within a blob store
///
/// Message bodies live at `hex(SHA-512(message_id))/original.md`: a fixed
/// length, path-safe location that the same message id always maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobAddress(String);

impl BlobAddress {
    /// Create an address from a raw path, rejecting empty paths
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(ArchiveError::validation("Path must be a non-empty string"));
        }
        Ok(Self(address))
    }

    /// Address of the body of a message
    pub fn for_message(id: &MessageId) -> Self {
        Self(format!("{}/{}", body_digest(id), BODY_FILE))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the address
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for BlobAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded SHA-512 digest of a message id
pub fn body_digest(id: &MessageId) -> String {
    hex::encode(Sha512::digest(id.as_str().as_bytes()))
}

/// Trait for blob storage operations
///
/// Writes are overwrite-by-address (last writer wins), so repeating a put
/// with the same bytes is always safe. Implementations handle any
/// compression internally.
pub trait BlobStore: Send + Sync {
    /// Store a payload at an address
    fn put(&self, address: &BlobAddress, payload: &[u8]) -> Result<()>;

    /// Retrieve the full payload stored at an address
    ///
    /// Fails with `NotFound` if nothing is stored there. A partial read is
    /// never returned as success.
    fn get(&self, address: &BlobAddress) -> Result<Vec<u8>>;
}
