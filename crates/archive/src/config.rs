//! Archive configuration
//!
//! Loaded from (in order of priority):
//! 1. JSON file (`~/.config/list-archive/archive.json`)
//! 2. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ArchiveError;
use crate::repository::ArchiveRepository;
use crate::storage::{BucketCredentials, FileBlobStore, SqliteDocumentStore};

/// Config filename in the archive config directory
const CONFIG_FILE: &str = "archive.json";

const DATABASE_ENV: &str = "ARCHIVE_DATABASE";
const BUCKET_ENV: &str = "ARCHIVE_BUCKET";
const BLOB_ROOT_ENV: &str = "ARCHIVE_BLOB_ROOT";

/// Where the archive keeps its data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveConfig {
    /// SQLite database holding the metadata collections
    pub database: PathBuf,
    /// Directory holding one blob directory per bucket
    ///
    /// Defaults to `blobs` next to the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_root: Option<PathBuf>,
    /// Blob store credentials as `key/secret/bucket`
    ///
    /// Without them the archive is metadata-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl ArchiveConfig {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            blob_root: None,
            bucket: None,
        }
    }

    pub fn with_bucket(mut self, credentials: impl Into<String>) -> Self {
        self.bucket = Some(credentials.into());
        self
    }

    pub fn with_blob_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.blob_root = Some(root.into());
        self
    }

    /// Load configuration using the following priority:
    /// 1. JSON file (~/.config/list-archive/archive.json)
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if config::config_exists(CONFIG_FILE) {
            return config::load_json(CONFIG_FILE);
        }
        Self::from_env()
    }

    /// Load configuration from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse archive config JSON")
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| var(name).filter(|v| !v.is_empty());
        let database = non_empty(DATABASE_ENV)
            .with_context(|| format!("{DATABASE_ENV} environment variable not set"))?;

        Ok(Self {
            database: PathBuf::from(database),
            blob_root: non_empty(BLOB_ROOT_ENV).map(PathBuf::from),
            bucket: non_empty(BUCKET_ENV),
        })
    }

    /// Get the default config file path (~/.config/list-archive/archive.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }

    /// Parsed blob store credentials, if configured
    pub fn bucket_credentials(&self) -> crate::Result<Option<BucketCredentials>> {
        self.bucket.as_deref().map(BucketCredentials::parse).transpose()
    }

    /// Directory holding the blobs of the configured bucket
    pub fn blob_dir(&self) -> crate::Result<Option<PathBuf>> {
        let Some(credentials) = self.bucket_credentials()? else {
            return Ok(None);
        };
        let root = match &self.blob_root {
            Some(root) => root.clone(),
            None => self
                .database
                .parent()
                .map(|dir| dir.join("blobs"))
                .unwrap_or_else(|| PathBuf::from("blobs")),
        };
        Ok(Some(root.join(credentials.bucket)))
    }

    /// Open the repository this configuration describes
    pub fn open(&self) -> crate::Result<ArchiveRepository> {
        let blob_dir = self.blob_dir()?;

        if let Some(parent) = self.database.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ArchiveError::from)?;
        }
        let documents = Arc::new(SqliteDocumentStore::open(&self.database)?);

        let repo = match blob_dir {
            Some(dir) => ArchiveRepository::new(documents, Arc::new(FileBlobStore::new(&dir)?)),
            None => ArchiveRepository::metadata_only(documents),
        };
        log::info!(
            "[ARCHIVE] Opened {} (metadata_only={})",
            self.database.display(),
            repo.is_metadata_only()
        );
        Ok(repo)
    }
}
