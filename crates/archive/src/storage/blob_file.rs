//! File-based blob storage with zstd compression

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

use super::blob::{BlobAddress, BlobStore};
use crate::error::{ArchiveError, Result};

/// File-based blob storage with zstd compression
///
/// Directory structure:
/// ```text
/// blobs/
///   3f/
///     3fa9...e1/
///       original.md.zst     # body of the message whose id hashes to 3fa9...e1
///   c0/
///     c04b...77/
///       original.md.zst
/// ```
pub struct FileBlobStore {
    root: PathBuf,
    compression_level: i32,
}

impl FileBlobStore {
    /// Create a new file blob store at the given path
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).context("Failed to create blob storage directory")?;
        Ok(Self {
            root,
            compression_level: 3, // Good balance of speed vs compression
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the file path for a blob address
    ///
    /// The first segment is sharded by its first two characters. Segments
    /// must be plain names so an address can never leave the root.
    fn blob_path(&self, address: &BlobAddress) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for (i, segment) in address.segments().enumerate() {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('\\')
                || segment.contains(':')
            {
                return Err(ArchiveError::validation(format!(
                    "Invalid blob address: {address}"
                )));
            }
            if i == 0 {
                path.push(segment.get(..2).unwrap_or("xx"));
            }
            path.push(segment);
        }
        path.as_mut_os_string().push(".zst");
        Ok(path)
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, address: &BlobAddress, payload: &[u8]) -> Result<()> {
        let path = self.blob_path(address)?;
        let parent = path
            .parent()
            .ok_or_else(|| ArchiveError::validation(format!("Invalid blob address: {address}")))?;
        fs::create_dir_all(parent)?;

        let compressed = zstd::encode_all(payload, self.compression_level)
            .context("Failed to compress blob")?;

        // Each writer gets its own temp file; the rename is the only shared step.
        // A failed persist drops the temp file, which deletes it.
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&compressed)?;
        temp.persist(&path).map_err(|e| ArchiveError::from(e.error))?;

        log::debug!("[BLOB] Stored {} ({} bytes)", address, payload.len());
        Ok(())
    }

    fn get(&self, address: &BlobAddress) -> Result<Vec<u8>> {
        let path = self.blob_path(address)?;

        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArchiveError::not_found(format!("blob {address}")));
            }
            Err(e) => return Err(e.into()),
        };

        // Drain the whole stream; a truncated frame fails here
        let mut decoder = zstd::Decoder::new(file)?;
        let mut payload = Vec::new();
        decoder
            .read_to_end(&mut payload)
            .with_context(|| format!("Failed to decompress blob {address}"))?;

        Ok(payload)
    }
}

impl std::fmt::Debug for FileBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBlobStore")
            .field("root", &self.root)
            .finish()
    }
}
